//! Response compression.

use axum::body::HttpBody;
use axum::http::{header, Response, StatusCode};
use tower_http::compression::{
    predicate::{And, NotForContentType, Predicate, SizeAbove},
    CompressionLayer,
};

use crate::config::CompressionConfig;

/// Bodies above the threshold, excluding images, gRPC, event streams and
/// partial content.
pub type CompressionPredicate = And<
    And<And<And<SizeAbove, NotForContentType>, NotForContentType>, NotForContentType>,
    NotForPartialContent,
>;

/// Byte ranges address the identity encoding and are passed through as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotForPartialContent;

impl Predicate for NotForPartialContent {
    fn should_compress<B>(&self, response: &Response<B>) -> bool
    where
        B: HttpBody,
    {
        response.status() != StatusCode::PARTIAL_CONTENT
            && !response.headers().contains_key(header::CONTENT_RANGE)
    }
}

/// Build the compression stage. A disabled config yields a layer that
/// negotiates no encodings, so bodies pass through untouched.
pub fn compression_layer(config: &CompressionConfig) -> CompressionLayer<CompressionPredicate> {
    let predicate = SizeAbove::new(config.min_size)
        .and(NotForContentType::GRPC)
        .and(NotForContentType::IMAGES)
        .and(NotForContentType::SSE)
        .and(NotForPartialContent);

    CompressionLayer::new()
        .gzip(config.enabled && config.gzip)
        .deflate(config.enabled && config.deflate)
        .compress_when(predicate)
}
