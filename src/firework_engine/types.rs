/// Couleur RGB d'une fusée, composantes dans [0, 1)
pub type Color = glam::Vec3;

/// Horodatage en millisecondes, horloge monotone, origine arbitraire.
pub type Timestamp = u64;

pub const SECOND_MS: f32 = 1000.0;

// ------------------------
// TickReport
// ------------------------
/// Bilan d'un tick du `Fleet`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Fusées créées par le timer pendant ce tick
    pub spawned: usize,
    /// Fusées passées de CREATED à FIRED
    pub launched: usize,
    /// Explosions déclenchées (entrée dans EXPLODE_START)
    pub explosions_started: usize,
    /// Fusées arrivées dans CLEANED_UP
    pub cleaned_up: usize,
    /// Fusées dont `update` a été appelé
    pub updated: usize,
    /// Fusées encore vivantes après le tick
    pub live: usize,
}
