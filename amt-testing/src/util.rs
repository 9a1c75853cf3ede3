/// Initializes stdout logging for test runs.
///
/// Every test calls this; the error fern returns on a second
/// initialization is deliberately ignored.
pub fn init_logging() -> anyhow::Result<()> {
	let _ = fern::Dispatch::new()
		.format(|out, msg, rec| {
			let now = chrono::Local::now();
			let stamp = now.format("%H:%M:%S.%3f");
			out.finish(format_args!("[{} {: >5}] {}", stamp, rec.level(), msg))
		})
		.level(log::LevelFilter::Trace)
		.chain(std::io::stdout())
		.apply();
	Ok(())
}
