fn main() {
    // Compile the SLINT UI
    slint_build::compile("ui/main.slint").expect("ui/main.slint should compile");
}
