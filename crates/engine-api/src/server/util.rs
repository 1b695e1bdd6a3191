fn apply_cors_headers(headers: &mut axum::http::HeaderMap) {
    headers.insert(
        HeaderName::from_static("access-control-allow-origin"),
        HeaderValue::from_static("*"),
    );
    headers.insert(
        HeaderName::from_static("access-control-allow-methods"),
        HeaderValue::from_static("GET,POST,OPTIONS,PUT,PATCH,DELETE"),
    );
    headers.insert(
        HeaderName::from_static("access-control-allow-headers"),
        HeaderValue::from_static("*"),
    );
    headers.insert(
        HeaderName::from_static("access-control-max-age"),
        HeaderValue::from_static("3600"),
    );
}

fn default_sqlite_path() -> String {
    std::env::var("SQLITE_PATH")
        .ok()
        .filter(|path| !path.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SQLITE_PATH.to_string())
}

/// Server identity is minted at the HTTP boundary, the one place wall-clock
/// input is allowed; everything downstream derives from the returned seed.
fn derive_server_credentials(now_ms: u64, counter: u64) -> (String, u32) {
    let server_id = engine_core::rng::seeded_id(
        "srv",
        (now_ms & 0xffff_ffff) as u32,
        now_ms >> 32,
        counter,
    );
    let seed = (now_ms ^ counter.wrapping_mul(0x9E37_79B9)) as u32;
    (server_id, seed)
}

fn parse_role(value: &str) -> Result<Role, HttpApiError> {
    Role::parse(value).ok_or_else(|| {
        HttpApiError::invalid_query(
            "playerRole must be citizen, business_owner, or politician",
            Some(format!("player_role={value}")),
        )
    })
}
