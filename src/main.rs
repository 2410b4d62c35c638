use std::process::ExitCode;

fn main() -> ExitCode {
    mizuchi_upload_lib::run()
}
