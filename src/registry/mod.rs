//! Registry module for Docker registry interactions
//!
//! This module provides the client for Docker Registry HTTP API v2: URL construction, bearer
//! token negotiation, manifest digest resolution and blob retrieval.

pub mod auth;
pub mod blob;
pub mod client;
pub mod image;
pub mod manifest;

pub use auth::{AuthChallenge, parse_challenge};
pub use client::{
    AuthConfig, DEFAULT_DOCKER_REGISTRY, MEDIA_TYPE_MANIFEST_V2, Registry, RegistryOptions,
    create_registry_client, decode_body,
};
pub use image::{Image, parse_image};
pub use manifest::{Descriptor, ImageManifest, is_canonical_digest};
