use player::FrameFetcher;

use crate::app::utils::decode_frame_to_pixel_buffer;
use crate::MainWindow;

/// Fetch and decode a frame in a background thread, then hand the result
/// back to the event loop. Results for a frame that is no longer shown are
/// dropped there.
pub fn request_frame(window_weak: slint::Weak<MainWindow>, fetcher: FrameFetcher, locator: String) {
    debug!("Requesting frame {}", locator);

    std::thread::spawn(move || {
        let result = tokio::runtime::Runtime::new()
            .map_err(anyhow::Error::from)
            .and_then(|rt| rt.block_on(fetcher.fetch(&locator)))
            .and_then(|bytes| decode_frame_to_pixel_buffer(&bytes));

        slint::invoke_from_event_loop(move || {
            let Some(window) = window_weak.upgrade() else {
                return;
            };
            if window.get_frame_locator() != locator.as_str() {
                debug!("Frame {} arrived after the selection moved on", locator);
                return;
            }
            match result {
                Ok(buffer) => {
                    window.set_frame_image(slint::Image::from_rgba8(buffer));
                    window.invoke_frame_loaded(locator.into());
                }
                Err(e) => {
                    error!("Failed to load frame {}: {}", locator, e);
                    window.invoke_frame_failed(locator.into());
                }
            }
        })
        .ok();
    });
}
