mod artifact;

pub use artifact::MavenArtifact;

/// Where Forge publishes its installer jars.
pub const FORGE_MAVEN: &str = "https://maven.minecraftforge.net";
