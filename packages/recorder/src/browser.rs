//! Replay page driven through headless Chrome

use crate::config::{ControlSelectors, RecorderConfig, Viewport};
use crate::source::ReplaySource;
use crate::{RecorderError, Result};
use headless_chrome::protocol::cdp::Page;
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::{Browser, LaunchOptions, Tab};
use replay_capture::{RenderSurface, SurfaceError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A replay page open in its own Chrome instance.
///
/// Chrome is shut down when the surface is dropped.
pub struct ChromeSurface {
    tab: Arc<Tab>,
    // Must outlive `tab`
    _browser: Browser,
    url: String,
    controls: ControlSelectors,
    viewport: Viewport,
}

impl ChromeSurface {
    /// Launch Chrome with the configured viewport and open a blank tab.
    /// The replay itself is loaded by [`RenderSurface::wait_ready`].
    pub fn launch(config: &RecorderConfig, source: &ReplaySource, headless: bool) -> Result<Self> {
        let viewport = config.viewport;

        let browser = Browser::new(LaunchOptions {
            headless,
            window_size: Some((viewport.width, viewport.height)),
            idle_browser_timeout: config.ready_timeout().max(Duration::from_secs(30)),
            ..Default::default()
        })
        .map_err(|e| RecorderError::Browser(e.to_string()))?;

        let tab = browser
            .new_tab()
            .map_err(|e| RecorderError::Browser(e.to_string()))?;

        debug!(
            "Launched Chrome ({}x{}, headless: {})",
            viewport.width, viewport.height, headless
        );

        Ok(Self {
            tab,
            _browser: browser,
            url: source.url.clone(),
            controls: config.controls.clone(),
            viewport,
        })
    }

    fn evaluate_bool(&self, script: &str) -> std::result::Result<bool, SurfaceError> {
        let value = self
            .tab
            .evaluate(script, false)
            .map_err(|e| SurfaceError::Script(e.to_string()))?
            .value;

        match value {
            Some(serde_json::Value::Bool(b)) => Ok(b),
            other => Err(SurfaceError::Script(format!(
                "expected a boolean, got {:?}",
                other
            ))),
        }
    }
}

impl RenderSurface for ChromeSurface {
    fn wait_ready(&mut self, timeout: Duration) -> std::result::Result<(), SurfaceError> {
        info!("🌐 Loading replay: {}", self.url);

        self.tab.set_default_timeout(timeout);
        self.tab
            .navigate_to(&self.url)
            .map_err(|e| SurfaceError::Browser(e.to_string()))?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| SurfaceError::Browser(e.to_string()))?;

        info!("⏳ Waiting for battle UI...");
        self.tab
            .wait_for_element_with_custom_timeout(&self.controls.ready, timeout)
            .map_err(|_| SurfaceError::Timeout {
                what: format!("selector {}", self.controls.ready),
                timeout,
            })?;

        Ok(())
    }

    fn accelerate(&mut self, clicks: u32) -> std::result::Result<(), SurfaceError> {
        let script = click_repeatedly_script(&self.controls.speed, clicks)?;

        if !self.evaluate_bool(&script)? {
            warn!(
                "Speed control {} not found, replay plays at normal speed",
                self.controls.speed
            );
        }
        Ok(())
    }

    fn start_playback(&mut self) -> std::result::Result<(), SurfaceError> {
        let script = click_first_script(&[
            self.controls.play.as_str(),
            self.controls.play_fallback.as_str(),
        ])?;

        if !self.evaluate_bool(&script)? {
            return Err(SurfaceError::MissingControl(self.controls.play.clone()));
        }
        Ok(())
    }

    fn probe_terminal(&mut self) -> std::result::Result<bool, SurfaceError> {
        let script = enabled_script(&self.controls.play)?;
        self.evaluate_bool(&script)
    }

    fn capture_snapshot(&mut self, quality: u8) -> std::result::Result<Vec<u8>, SurfaceError> {
        self.tab
            .capture_screenshot(
                CaptureScreenshotFormatOption::Jpeg,
                Some(u32::from(quality)),
                Some(snapshot_clip(self.viewport)),
                true,
            )
            .map_err(|e| SurfaceError::Snapshot(e.to_string()))
    }
}

/// Snapshot region: the configured viewport at device scale 1
fn snapshot_clip(viewport: Viewport) -> Page::Viewport {
    Page::Viewport {
        x: 0.0,
        y: 0.0,
        width: f64::from(viewport.width),
        height: f64::from(viewport.height),
        scale: 1.0,
    }
}

fn js_string(s: &str) -> std::result::Result<String, SurfaceError> {
    serde_json::to_string(s).map_err(|e| SurfaceError::Script(e.to_string()))
}

/// Click the element matching `selector` `clicks` times. Evaluates to
/// whether the element exists.
fn click_repeatedly_script(selector: &str, clicks: u32) -> std::result::Result<String, SurfaceError> {
    Ok(format!(
        r#"(() => {{
    const btn = document.querySelector({});
    if (!btn) return false;
    for (let i = 0; i < {}; i++) btn.click();
    return true;
}})()"#,
        js_string(selector)?,
        clicks
    ))
}

/// Click the first element matching any of `selectors`, in order.
/// Evaluates to whether anything was clicked.
fn click_first_script(selectors: &[&str]) -> std::result::Result<String, SurfaceError> {
    let lookups = selectors
        .iter()
        .map(|s| js_string(s).map(|quoted| format!("document.querySelector({})", quoted)))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(format!(
        r#"(() => {{
    const btn = {};
    if (!btn) return false;
    btn.click();
    return true;
}})()"#,
        lookups.join(" || ")
    ))
}

/// Evaluates to whether the element exists and is not disabled
fn enabled_script(selector: &str) -> std::result::Result<String, SurfaceError> {
    Ok(format!(
        r#"(() => {{
    const btn = document.querySelector({});
    return !!(btn && !btn.disabled);
}})()"#,
        js_string(selector)?
    ))
}
