#[derive(Debug)]
pub enum ServerError {
    Io(std::io::Error),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "server io error: {err}"),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<std::io::Error> for ServerError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

#[derive(Debug)]
struct HttpApiError {
    status: StatusCode,
    error: ApiError,
}

fn status_for_code(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::GameNotFound => StatusCode::NOT_FOUND,
        ErrorCode::InvalidAuth => StatusCode::UNAUTHORIZED,
        ErrorCode::WrongRole => StatusCode::FORBIDDEN,
        ErrorCode::WrongPhase => StatusCode::CONFLICT,
        ErrorCode::ServerFull => StatusCode::FORBIDDEN,
        ErrorCode::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ErrorCode::InvalidAction => StatusCode::BAD_REQUEST,
        ErrorCode::InvalidQuery => StatusCode::BAD_REQUEST,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl HttpApiError {
    fn from_api(error: ApiError) -> Self {
        Self {
            status: status_for_code(error.error_code),
            error,
        }
    }

    fn game_not_found(server_id: &str) -> Self {
        Self::from_api(ApiError::new(
            ErrorCode::GameNotFound,
            "serverId does not match a known game",
            Some(format!("server_id={server_id}")),
        ))
    }

    fn invalid_query(message: impl Into<String>, details: Option<String>) -> Self {
        Self::from_api(ApiError::new(ErrorCode::InvalidQuery, message, details))
    }

    fn internal(message: impl Into<String>, details: Option<String>) -> Self {
        Self::from_api(ApiError::new(ErrorCode::InternalError, message, details))
    }
}

impl IntoResponse for HttpApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}
