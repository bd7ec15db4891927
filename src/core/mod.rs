// ─── Blocklaunch Core ───
// Instance manager backend for a Minecraft-style game directory.
//
// Architecture:
//   core/
//     instance/   — Instance aggregate, persistence, install orchestrator
//     version/    — Mojang manifest, version JSON, catalog, resolver
//     loaders/    — Installer seam, progress, Vanilla / Fabric / Forge
//     content/    — Pack manifest, registry client, sharded download worker
//     launch/     — Launch command builder, synthesis, process spawn
//     maven/      — Maven coordinates
//     downloader/ — Concurrent downloads with SHA-1 validation
//     assets/     — Asset index + object downloads
//     auth/       — Launch identity
//     state/      — Settings and shared collaborators

pub mod assets;
pub mod auth;
pub mod content;
pub mod downloader;
pub mod error;
pub mod http;
pub mod instance;
pub mod launch;
pub mod loaders;
pub mod maven;
pub mod network;
pub mod paths;
pub mod state;
pub mod version;
