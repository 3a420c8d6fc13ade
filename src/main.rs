fn main() -> std::process::ExitCode {
    permission_copilot::run()
}
