/// Route `log` output to stdout, controlled by `RUST_LOG`.
///
/// Every test calls this, only the first call installs the logger.
pub fn init_logging() {
    let _ = simple_logger::SimpleLogger::new().env().init();
}
