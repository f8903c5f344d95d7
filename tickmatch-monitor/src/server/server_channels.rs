use tokio::sync::mpsc;

use super::{MonitorHttpRequest, MonitorHttpResponse};

/*----- */
// Http Channels
/*----- */
// Unbounded on both legs: handlers fire a request without awaiting and the
// monitor replies the same way.
#[derive(Debug)]
pub struct MonitorHttpChannel {
    pub http_request_rx: mpsc::UnboundedReceiver<MonitorHttpRequest>,
    pub http_response_tx: mpsc::UnboundedSender<MonitorHttpResponse>,
}

#[derive(Debug)]
pub struct ServerHttpChannel {
    pub http_request_tx: mpsc::UnboundedSender<MonitorHttpRequest>,
    pub http_response_rx: mpsc::UnboundedReceiver<MonitorHttpResponse>,
}

pub fn make_http_channels() -> (MonitorHttpChannel, ServerHttpChannel) {
    let (http_request_tx, http_request_rx) = mpsc::unbounded_channel();
    let (http_response_tx, http_response_rx) = mpsc::unbounded_channel();

    let monitor_http_channel = MonitorHttpChannel {
        http_request_rx,
        http_response_tx,
    };

    let server_http_channel = ServerHttpChannel {
        http_request_tx,
        http_response_rx,
    };

    (monitor_http_channel, server_http_channel)
}
