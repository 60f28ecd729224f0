fn main() {
  magpie::main()
}
