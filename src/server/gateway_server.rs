//! entry point called by main to run the gateway
//!
//! This will create some threads to
//! - listen for scream datagrams and push decoded chunks to their channels
//! - bridge each channel's chunks through an opus encoder (one per channel)
//! - serve one websocket per subscriber
//!
//! the calling thread becomes the websocket accept loop and never returns
//! under normal operation.
use log::{error, info, warn};
use std::{net::TcpListener, sync::Arc, thread};

use crate::{
    common::{box_error::BoxError, config::Config},
    scream::sink::{self, SourceRegistry},
    server::{client_thread, gateway::Gateway},
};

/// To start the gateway, call this function with the config file name
/// (usually hurl.json).
pub fn run(config_file: &str) -> Result<(), BoxError> {
    let defaults = json::object! {
        "udp_port": 4011,
        "ws_port": 8080,
        "default_channel": "default",
        "channels": {}
    };
    let config = Config::build(String::from(config_file), defaults)?;
    let udp_port = config.get_u32_value("udp_port", None)?;
    let ws_port = config.get_u32_value("ws_port", None)?;
    let default_channel = config.get_str_value("default_channel", None)?;

    let gateway = Gateway::new(&default_channel);

    // static channel to source bindings from the config
    let mut registry = SourceRegistry::new();
    for (channel, source) in config.get_channel_map("channels") {
        info!("channel {} fed by {}", channel, source);
        registry.associate(&channel, &source);
        gateway.ensure_channel(&channel);
    }

    // scream sink thread
    let sink_gateway = Arc::clone(&gateway);
    let _sink_handle = thread::spawn(move || {
        if let Err(e) = sink::run(udp_port, registry, sink_gateway) {
            error!("scream sink died: {}", e);
        }
    });

    // this thread accepts subscribers
    let listener = TcpListener::bind(format!("0.0.0.0:{}", ws_port))?;
    info!("listening for subscribers on port {}", ws_port);
    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                let client_gateway = Arc::clone(&gateway);
                thread::spawn(move || {
                    let _res = client_thread::run(stream, client_gateway);
                });
            }
            Err(e) => {
                warn!("accept failed: {}", e);
            }
        }
    }
    Ok(())
}
