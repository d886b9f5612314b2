/// Generator status flags and their bitmask representation.
pub mod enums;
/// Angular separation and fixed-radius association between jets and particles.
pub mod geometry;
/// Particle Data Group identifiers used by the classifiers.
pub mod pdg;
/// Selection masks over particle identity codes.
pub mod pid;
/// A Cartesian four-momentum type with the usual collider kinematics.
pub mod vectors;
