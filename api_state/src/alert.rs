use std::rc::Rc;

/// Presents an unrecovered request failure to the user.
///
/// [`ApiStateController`](crate::ApiStateController) calls this once per failed
/// `execute` or `refresh` when `show_error_alert` is enabled.
pub trait ErrorAlert {
    /// Show a blocking alert with the given title and message.
    fn alert(&self, title: &str, message: &str);
}

impl<F> ErrorAlert for F
where
    F: Fn(&str, &str),
{
    fn alert(&self, title: &str, message: &str) {
        self(title, message)
    }
}

/// Writes alerts to the `log` facade at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAlert;

impl ErrorAlert for LogAlert {
    fn alert(&self, title: &str, message: &str) {
        log::error!("{title}: {message}");
    }
}

/// Presents alerts with the browser's `window.alert`.
#[cfg(any(feature = "hydrate", feature = "csr"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserAlert;

#[cfg(any(feature = "hydrate", feature = "csr"))]
impl ErrorAlert for BrowserAlert {
    fn alert(&self, title: &str, message: &str) {
        let shown = web_sys::window()
            .map(|window| window.alert_with_message(&format!("{title}\n\n{message}")));
        match shown {
            Some(Ok(())) => {}
            Some(Err(_)) | None => log::error!("{title}: {message}"),
        }
    }
}

/// The presenter used when none is configured.
pub(crate) fn default_alert() -> Rc<dyn ErrorAlert> {
    cfg_if::cfg_if! {
        if #[cfg(any(feature = "hydrate", feature = "csr"))] {
            Rc::new(BrowserAlert)
        } else {
            Rc::new(LogAlert)
        }
    }
}
