//! OpenAPI documentation for the upload endpoint.
//!
//! Served as JSON at `/openapi.json` and rendered with Scalar at `/docs`.

use crate::api::handlers::upload;
use crate::api::models::upload::{ErrorBody, UploadResponse, UploadedFile};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "repodrop",
        description = "Upload files into a GitHub repository and get back a public URL"
    ),
    paths(upload::upload_file),
    components(schemas(UploadResponse, UploadedFile, ErrorBody)),
    tags((name = "upload", description = "File upload"))
)]
pub struct ApiDoc;
