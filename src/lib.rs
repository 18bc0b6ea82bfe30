//! # Orius Scanner
//!
//! Classifies photographed or uploaded Brazilian documents (RG, CNH, proof
//! of residence, power of attorney, deed, bylaws, meeting minutes) with a
//! hosted multimodal model and extracts their fields into typed records
//! that a person reviews in an editable form.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌─────────────────┐
//! │ ImageInput  │──▶│  Batch loop  │──▶│  DocumentData   │
//! │ file/camera │   │ classify →   │   │  + FormView     │
//! └─────────────┘   │ extract      │   └───────┬─────────┘
//!                   └──────┬───────┘           │
//!                          ▼           ┌───────┴───────┐
//!                   ┌────────────┐     ▼               ▼
//!                   │ ModelClient│  ┌──────┐      ┌──────────┐
//!                   │  (Gemini)  │  │ CLI  │      │ HTTP UI  │
//!                   └────────────┘  └──────┘      └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export GEMINI_API_KEY=...
//! orius scan rg-frente.jpg conta-luz.pdf
//! orius serve                      # browser UI on 127.0.0.1:8080
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Document types and extracted records |
//! | [`schema`] | Response schemas for the model calls |
//! | [`gemini`] | Model client, classification and extraction calls |
//! | [`image`] | Image input from files, data URLs and base64 |
//! | [`batch`] | Sequential batch loop with per-item status |
//! | [`progress`] | Batch progress reporting on stderr |
//! | [`form`] | Per-type review form layout |
//! | [`server`] | Browser UI and JSON API |

pub mod batch;
pub mod config;
pub mod form;
pub mod gemini;
pub mod image;
pub mod models;
pub mod progress;
pub mod scan_cmd;
pub mod schema;
pub mod server;
