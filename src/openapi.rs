use utoipa::OpenApi;

use crate::{
    handler::{
        contact::{ContactRequest, ContactResponse, ErrorResponse},
        health::Health,
    },
    handler,
};

#[derive(OpenApi)]
#[openapi(
    paths(handler::health::health, handler::contact::submit_contact),
    components(schemas(Health, ContactRequest, ContactResponse, ErrorResponse)),
    tags(
        (name = "health", description = "Health check"),
        (name = "contact", description = "Contact form delivery")
    )
)]
pub struct ApiDoc;
