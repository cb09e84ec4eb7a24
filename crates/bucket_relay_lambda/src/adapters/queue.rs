pub trait MessageQueue {
    fn send_message(&self, queue_url: &str, body: &str) -> Result<(), String>;

    /// Acknowledges a received message so the queue does not redeliver it.
    fn delete_message(&self, queue_url: &str, receipt_handle: &str) -> Result<(), String>;
}
