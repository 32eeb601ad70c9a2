use std::rc::Rc;

use crate::{alert::default_alert, ErrorAlert, RequestError};

const DEFAULT_ERROR_TITLE: &str = "Error";
const DEFAULT_PAGE_SIZE: u32 = 20;
const DEFAULT_INITIAL_PAGE: u32 = 1;

/// App-wide defaults for every controller created under a scope.
/// Provide them with [`provide_default_options`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultOptions {
    /// Whether request failures are alerted to the user.
    pub show_error_alert: bool,
    /// Title of the failure alert.
    pub error_title: String,
    /// Number of items requested per page.
    pub page_size: u32,
}

impl Default for DefaultOptions {
    fn default() -> Self {
        Self {
            show_error_alert: true,
            error_title: DEFAULT_ERROR_TITLE.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Provides [`DefaultOptions`] to the current scope.
pub fn provide_default_options(options: DefaultOptions) {
    leptos::provide_context(options);
}

/// The [`DefaultOptions`] of the current scope, or the built-in defaults.
pub fn use_default_options() -> DefaultOptions {
    leptos::use_context::<DefaultOptions>().unwrap_or_default()
}

/// Options for an [`ApiStateController`](crate::ApiStateController).
pub struct ApiStateOptions<T> {
    /// Seed value, restored on reset.
    pub initial_data: Option<T>,
    /// Called with every committed result.
    pub on_success: Option<Rc<dyn Fn(&T)>>,
    /// Called with every unrecovered failure.
    pub on_error: Option<Rc<dyn Fn(&RequestError)>>,
    /// Present failures through `alert`. Default is true.
    pub show_error_alert: bool,
    /// Alert title. Default is "Error".
    pub error_title: String,
    /// Where alerts are presented.
    pub alert: Rc<dyn ErrorAlert>,
}

impl<T> ApiStateOptions<T> {
    /// Set the seed value.
    pub fn set_initial_data(self, initial_data: Option<T>) -> Self {
        ApiStateOptions {
            initial_data,
            ..self
        }
    }

    /// Set the success callback.
    pub fn set_on_success(self, on_success: impl Fn(&T) + 'static) -> Self {
        ApiStateOptions {
            on_success: Some(Rc::new(on_success)),
            ..self
        }
    }

    /// Set the error callback.
    pub fn set_on_error(self, on_error: impl Fn(&RequestError) + 'static) -> Self {
        ApiStateOptions {
            on_error: Some(Rc::new(on_error)),
            ..self
        }
    }

    /// Enable or disable failure alerts.
    pub fn set_show_error_alert(self, show_error_alert: bool) -> Self {
        ApiStateOptions {
            show_error_alert,
            ..self
        }
    }

    /// Set the alert title.
    pub fn set_error_title(self, error_title: impl Into<String>) -> Self {
        ApiStateOptions {
            error_title: error_title.into(),
            ..self
        }
    }

    /// Set the alert presenter.
    pub fn set_alert(self, alert: impl ErrorAlert + 'static) -> Self {
        ApiStateOptions {
            alert: Rc::new(alert),
            ..self
        }
    }
}

impl<T> Default for ApiStateOptions<T> {
    fn default() -> Self {
        let defaults = use_default_options();
        Self {
            initial_data: None,
            on_success: None,
            on_error: None,
            show_error_alert: defaults.show_error_alert,
            error_title: defaults.error_title,
            alert: default_alert(),
        }
    }
}

impl<T: Clone> Clone for ApiStateOptions<T> {
    fn clone(&self) -> Self {
        Self {
            initial_data: self.initial_data.clone(),
            on_success: self.on_success.clone(),
            on_error: self.on_error.clone(),
            show_error_alert: self.show_error_alert,
            error_title: self.error_title.clone(),
            alert: self.alert.clone(),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ApiStateOptions<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiStateOptions")
            .field("initial_data", &self.initial_data)
            .field("on_success", &self.on_success.as_ref().map(|_| "..."))
            .field("on_error", &self.on_error.as_ref().map(|_| "..."))
            .field("show_error_alert", &self.show_error_alert)
            .field("error_title", &self.error_title)
            .finish()
    }
}

/// Options for an [`OptimisticUpdate`](crate::OptimisticUpdate).
pub struct OptimisticOptions<T> {
    /// Called with the confirmed result.
    pub on_success: Option<Rc<dyn Fn(&T)>>,
    /// Called after a rollback, with the failure and the restored value.
    pub on_error: Option<Rc<dyn Fn(&RequestError, &T)>>,
}

impl<T> OptimisticOptions<T> {
    /// Set the success callback.
    pub fn set_on_success(self, on_success: impl Fn(&T) + 'static) -> Self {
        OptimisticOptions {
            on_success: Some(Rc::new(on_success)),
            ..self
        }
    }

    /// Set the rollback callback.
    pub fn set_on_error(self, on_error: impl Fn(&RequestError, &T) + 'static) -> Self {
        OptimisticOptions {
            on_error: Some(Rc::new(on_error)),
            ..self
        }
    }
}

impl<T> Default for OptimisticOptions<T> {
    fn default() -> Self {
        Self {
            on_success: None,
            on_error: None,
        }
    }
}

impl<T> Clone for OptimisticOptions<T> {
    fn clone(&self) -> Self {
        Self {
            on_success: self.on_success.clone(),
            on_error: self.on_error.clone(),
        }
    }
}

/// Options for a [`Pagination`](crate::Pagination) controller.
#[derive(Clone)]
pub struct PaginationOptions {
    /// Items requested per page. Default is 20.
    pub page_size: u32,
    /// Number of the first page. Default is 1.
    pub initial_page: u32,
    /// Called with every failed page load.
    pub on_error: Option<Rc<dyn Fn(&RequestError)>>,
}

impl PaginationOptions {
    /// Set the page size.
    pub fn set_page_size(self, page_size: u32) -> Self {
        PaginationOptions { page_size, ..self }
    }

    /// Set the number of the first page.
    pub fn set_initial_page(self, initial_page: u32) -> Self {
        PaginationOptions {
            initial_page,
            ..self
        }
    }

    /// Set the error callback.
    pub fn set_on_error(self, on_error: impl Fn(&RequestError) + 'static) -> Self {
        PaginationOptions {
            on_error: Some(Rc::new(on_error)),
            ..self
        }
    }

    /// Ensures the page size is positive and pages are numbered from 1 or later.
    pub fn validate(self) -> Self {
        let page_size = if self.page_size == 0 {
            leptos::logging::debug_warn!("page_size must be positive. Using {DEFAULT_PAGE_SIZE} instead.");
            DEFAULT_PAGE_SIZE
        } else {
            self.page_size
        };

        let initial_page = if self.initial_page == 0 {
            leptos::logging::debug_warn!("initial_page must be at least 1. Using {DEFAULT_INITIAL_PAGE} instead.");
            DEFAULT_INITIAL_PAGE
        } else {
            self.initial_page
        };

        PaginationOptions {
            page_size,
            initial_page,
            on_error: self.on_error,
        }
    }
}

impl Default for PaginationOptions {
    fn default() -> Self {
        let defaults = use_default_options();
        Self {
            page_size: defaults.page_size,
            initial_page: DEFAULT_INITIAL_PAGE,
            on_error: None,
        }
        .validate()
    }
}

impl std::fmt::Debug for PaginationOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginationOptions")
            .field("page_size", &self.page_size)
            .field("initial_page", &self.initial_page)
            .field("on_error", &self.on_error.as_ref().map(|_| "..."))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_keeps_positive_values() {
        let options = PaginationOptions::default()
            .set_page_size(10)
            .set_initial_page(3)
            .validate();

        assert_eq!(options.page_size, 10, "page_size should remain unchanged");
        assert_eq!(options.initial_page, 3, "initial_page should remain unchanged");
    }

    #[test]
    fn validate_replaces_zero_values() {
        let options = PaginationOptions::default()
            .set_page_size(0)
            .set_initial_page(0)
            .validate();

        assert_eq!(options.page_size, 20, "page_size should fall back to 20");
        assert_eq!(options.initial_page, 1, "initial_page should fall back to 1");
    }

    #[test]
    fn builtin_defaults() {
        let options = ApiStateOptions::<u32>::default();
        assert!(options.show_error_alert);
        assert_eq!(options.error_title, "Error");
        assert_eq!(options.initial_data, None);

        let pagination = PaginationOptions::default();
        assert_eq!(pagination.page_size, 20);
        assert_eq!(pagination.initial_page, 1);
    }

    #[test]
    fn test_default_from_context() {
        let _ = leptos::create_runtime();

        provide_default_options(DefaultOptions {
            show_error_alert: false,
            error_title: "Garage".to_string(),
            page_size: 5,
        });

        let options: ApiStateOptions<()> = Default::default();
        assert!(
            !options.show_error_alert,
            "show_error_alert should match the provided defaults"
        );
        assert_eq!(
            options.error_title, "Garage",
            "error_title should match the provided defaults"
        );

        let pagination = PaginationOptions::default();
        assert_eq!(
            pagination.page_size, 5,
            "page_size should match the provided defaults"
        );
    }
}
