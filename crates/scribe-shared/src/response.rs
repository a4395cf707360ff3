//! Standardized API response types (RFC 7807 compliant for errors).

use serde::{Deserialize, Serialize};

/// One page of a listing.
///
/// `next` / `previous` are page numbers rather than URLs so the body does not
/// depend on how the server is mounted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub count: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
    pub next: Option<u64>,
    pub previous: Option<u64>,
    pub results: Vec<T>,
}

impl<T> PaginatedResponse<T> {
    pub fn new(results: Vec<T>, count: u64, page: u64, page_size: u64) -> Self {
        let total_pages = count.div_ceil(page_size.max(1));
        Self {
            count,
            page,
            page_size,
            total_pages,
            next: (page < total_pages).then_some(page + 1),
            previous: (page > 1).then(|| page - 1),
            results,
        }
    }
}

/// RFC 7807 Problem Details for HTTP APIs.
///
/// See: https://datatracker.ietf.org/doc/html/rfc7807
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// A URI reference that identifies the problem type.
    #[serde(rename = "type")]
    pub error_type: String,

    pub title: String,

    /// The HTTP status code.
    pub status: u16,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorResponse {
    pub fn new(status: u16, title: impl Into<String>) -> Self {
        Self {
            error_type: "about:blank".to_string(),
            title: title.into(),
            status,
            detail: None,
            instance: None,
            request_id: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(400, "Bad Request").with_detail(detail)
    }

    pub fn unauthorized() -> Self {
        Self::new(401, "Unauthorized")
    }

    pub fn forbidden() -> Self {
        Self::new(403, "Forbidden")
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(404, "Not Found").with_detail(detail)
    }

    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::new(409, "Conflict").with_detail(detail)
    }

    pub fn too_many_requests(retry_after_secs: u64) -> Self {
        Self::new(429, "Too Many Requests").with_detail(format!(
            "Rate limit exceeded. Try again in {retry_after_secs} seconds."
        ))
    }

    pub fn internal_error() -> Self {
        Self::new(500, "Internal Server Error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_links() {
        let first: PaginatedResponse<u8> = PaginatedResponse::new(vec![1, 2], 5, 1, 2);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.next, Some(2));
        assert_eq!(first.previous, None);

        let last: PaginatedResponse<u8> = PaginatedResponse::new(vec![5], 5, 3, 2);
        assert_eq!(last.next, None);
        assert_eq!(last.previous, Some(2));
    }

    #[test]
    fn page_past_the_end_is_empty_but_well_formed() {
        let page: PaginatedResponse<u8> = PaginatedResponse::new(vec![], 3, 9, 20);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.next, None);
        assert_eq!(page.previous, Some(8));
    }

    #[test]
    fn problem_body_uses_type_key() {
        let body = serde_json::to_value(ErrorResponse::conflict("slug taken")).unwrap();
        assert_eq!(body["type"], "about:blank");
        assert_eq!(body["status"], 409);
        assert_eq!(body["detail"], "slug taken");
        assert!(body.get("instance").is_none());
    }
}
