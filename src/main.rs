fn main() {
    std::process::exit(blocklaunch_lib::run());
}
