/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Deployment override for printing fault details in responses and
    /// logs. `None` when the installation does not set it, in which case
    /// the default supplied to [`ResponsePolicy::from_config`] applies.
    pub print_error_details: Option<bool>,
    /// How business-fault envelopes map onto the HTTP status line.
    pub fault_status_mode: FaultStatusMode,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `PRINT_ERROR_DETAILS`  | unset                      |
    /// | `FAULT_STATUS_MODE`    | `embedded`                 |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let print_error_details: Option<bool> = std::env::var("PRINT_ERROR_DETAILS")
            .ok()
            .map(|v| {
                v.parse()
                    .expect("PRINT_ERROR_DETAILS must be true or false")
            });

        let fault_status_mode = match std::env::var("FAULT_STATUS_MODE")
            .unwrap_or_else(|_| "embedded".into())
            .as_str()
        {
            "embedded" => FaultStatusMode::Embedded,
            "mirror" => FaultStatusMode::Mirror,
            other => panic!("FAULT_STATUS_MODE must be 'embedded' or 'mirror', got '{other}'"),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            print_error_details,
            fault_status_mode,
        }
    }
}

/// How a business fault's code maps onto the HTTP status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FaultStatusMode {
    /// The status line stays 200; the envelope's `code` field carries the
    /// result. This is the default contract.
    #[default]
    Embedded,
    /// The status line mirrors the business code when it is a valid HTTP
    /// status code, falling back to 200 otherwise.
    Mirror,
}

/// Fault-rendering policy, resolved once at startup and read-only at
/// request time.
///
/// Shared as `Arc<ResponsePolicy>` between the fault interpreter, the
/// panic responder and the 404 fallback; immutable after construction, so
/// no locks are needed.
#[derive(Debug, Clone, Default)]
pub struct ResponsePolicy {
    print_error: bool,
    fault_status: FaultStatusMode,
}

impl ResponsePolicy {
    pub fn new(print_error: bool, fault_status: FaultStatusMode) -> Self {
        Self {
            print_error,
            fault_status,
        }
    }

    /// Resolve the deployment's print-error override against the default
    /// the caller supplies; installations that leave the flag unset get
    /// `default_print_error`.
    pub fn from_config(config: &ServerConfig, default_print_error: bool) -> Self {
        Self {
            print_error: config.print_error_details.unwrap_or(default_print_error),
            fault_status: config.fault_status_mode,
        }
    }

    /// Whether fault detail strings are included in envelopes and traces
    /// are logged for expected fault classes.
    pub fn print_error(&self) -> bool {
        self.print_error
    }

    pub fn fault_status(&self) -> FaultStatusMode {
        self.fault_status
    }
}
