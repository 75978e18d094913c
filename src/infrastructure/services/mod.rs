//! Infrastructure services

mod retrieval_service;

pub use retrieval_service::{
    RetrievalOutcome, RetrievalResponse, RetrievalService, SearchRequest,
};
