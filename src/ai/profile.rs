//! Pilot archetypes and their tuning numbers.

/// Behaviour archetype of a pilot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Profile {
    /// Human-flown; only locks on for homing weapons.
    Player,
    /// Charges straight in and never backs off.
    Brute,
    /// Short sight, fights up close with both weapons.
    Ambusher,
    /// Closes in disguised, retreats when its shield breaks.
    Controller,
    /// Easily lost, rarely dangerous.
    Fool,
}

/// Distances and behaviour switches for one profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileTuning {
    pub search_radius: f32,
    pub engage_distance: f32,
    /// Engage distance used while disguised.
    pub engage_distance_disguised: f32,
    pub disengage_distance: f32,
    pub retreats: bool,
    pub disguises: bool,
    pub fires_secondary: bool,
}

impl Profile {
    pub const ALL: [Profile; 5] = [
        Profile::Player,
        Profile::Brute,
        Profile::Ambusher,
        Profile::Controller,
        Profile::Fool,
    ];

    pub fn tuning(self) -> ProfileTuning {
        let (search, engage, engage_disguised, disengage, retreats, disguises, secondary) = match self {
            Profile::Player => (1200.0, 0.0, 0.0, 0.0, false, false, false),
            Profile::Brute => (2000.0, 350.0, 350.0, 550.0, false, false, false),
            Profile::Ambusher => (900.0, 250.0, 250.0, 450.0, false, false, true),
            Profile::Controller => (1500.0, 400.0, 200.0, 600.0, true, true, true),
            Profile::Fool => (600.0, 300.0, 300.0, 500.0, false, false, false),
        };
        ProfileTuning {
            search_radius: search,
            engage_distance: engage,
            engage_distance_disguised: engage_disguised,
            disengage_distance: disengage,
            retreats,
            disguises,
            fires_secondary: secondary,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Profile::Player => "player",
            Profile::Brute => "brute",
            Profile::Ambusher => "ambusher",
            Profile::Controller => "controller",
            Profile::Fool => "fool",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_case_insensitively() {
        for profile in Profile::ALL {
            assert_eq!(Profile::from_name(&profile.name().to_uppercase()), Some(profile));
        }
        assert_eq!(Profile::from_name("pirate"), None);
    }

    #[test]
    fn disengage_is_beyond_engage_for_fighting_profiles() {
        for profile in Profile::ALL.into_iter().filter(|&p| p != Profile::Player) {
            let t = profile.tuning();
            assert!(t.disengage_distance > t.engage_distance, "{profile:?}");
            assert!(t.engage_distance_disguised <= t.engage_distance, "{profile:?}");
        }
    }
}
