use std::fmt;

/// États du cycle de vie d'une fusée, dans l'ordre obligatoire.
///
/// Une fusée ne saute jamais d'état et ne revient jamais en arrière.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum RocketState {
    /// Créée, pas encore lancée
    #[default]
    Created = 0,
    /// En vol, traînée active
    Fired = 1,
    /// Déclenchement de l'explosion (transitoire)
    ExplodeStart = 2,
    /// Animation du nuage d'explosion
    Exploding = 3,
    /// Animation terminée, reste à libérer le corps
    Exploded = 4,
    /// Terminal : plus aucune ressource, plus jamais mise à jour
    CleanedUp = 5,
}

impl RocketState {
    pub const ALL: [RocketState; 6] = [
        RocketState::Created,
        RocketState::Fired,
        RocketState::ExplodeStart,
        RocketState::Exploding,
        RocketState::Exploded,
        RocketState::CleanedUp,
    ];

    /// Seul successeur autorisé, `None` pour l'état terminal.
    pub fn next(self) -> Option<Self> {
        match self {
            RocketState::Created => Some(RocketState::Fired),
            RocketState::Fired => Some(RocketState::ExplodeStart),
            RocketState::ExplodeStart => Some(RocketState::Exploding),
            RocketState::Exploding => Some(RocketState::Exploded),
            RocketState::Exploded => Some(RocketState::CleanedUp),
            RocketState::CleanedUp => None,
        }
    }

    #[inline]
    pub fn is_terminal(self) -> bool {
        self == RocketState::CleanedUp
    }

    pub fn name(&self) -> &'static str {
        match self {
            RocketState::Created => "CREATED",
            RocketState::Fired => "FIRED",
            RocketState::ExplodeStart => "EXPLODE_START",
            RocketState::Exploding => "EXPLODING",
            RocketState::Exploded => "EXPLODED",
            RocketState::CleanedUp => "CLEANED_UP",
        }
    }
}

impl fmt::Display for RocketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
