//! WASM bindings for the weft editing surface.
//!
//! Exposes one [`JsSurface`] object carrying the inbound host API. Native
//! shells load the module into their web view and drive the surface through
//! it; outbound notifications go over the channels the page provides.

mod log_buffer;
mod surface;
mod types;

pub use log_buffer::{LogCaptureLayer, clear_logs, recent_logs};
pub use surface::*;
pub use types::*;

use wasm_bindgen::prelude::*;

/// Install the panic hook and the logging stack.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();

    use tracing::Level;
    use tracing::subscriber::set_global_default;
    use tracing_subscriber::Registry;
    use tracing_subscriber::layer::SubscriberExt;

    let console_level = if cfg!(debug_assertions) {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let wasm_layer = tracing_wasm::WASMLayer::new(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(console_level)
            .build(),
    );

    let reg = Registry::default().with(wasm_layer).with(LogCaptureLayer);

    let _ = set_global_default(reg);
}
