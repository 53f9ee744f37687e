use anyhow::Result;

/// Runtime used by the host. Every event is handled on this one thread, which is what keeps the
/// tracker free of locks.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
