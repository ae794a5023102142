use std::time::Duration;

#[cfg(feature = "async-tokio")]
pub(crate) async fn async_sleep(d: Duration) {
    tokio::time::sleep(d).await;
}

#[cfg(all(feature = "async-smol", not(feature = "async-tokio")))]
pub(crate) async fn async_sleep(d: Duration) {
    smol::Timer::after(d).await;
}
