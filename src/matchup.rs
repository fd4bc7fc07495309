use crate::error::{validate_factions, MatchmakingError};
use crate::types::FactionMatchup;

/// Picks the faction pairing that best offsets a predicted role score margin
#[derive(Clone, Copy, Debug, Default)]
pub struct MatchupSelector;

impl MatchupSelector {
    pub fn new() -> Self {
        Self
    }

    /// Entry minimizing `|margin + win_differential|`, first one on ties.
    ///
    /// `margin` is roster one's net role score minus roster two's. Roster one
    /// plays `faction_a` of the returned entry.
    pub fn select<'a>(
        &self,
        margin: f64,
        table: &'a [FactionMatchup],
    ) -> Result<&'a FactionMatchup, MatchmakingError> {
        validate_factions(table)?;

        let mut best = &table[0];
        let mut best_residual = (margin + best.win_differential).abs();
        for entry in &table[1..] {
            let residual = (margin + entry.win_differential).abs();
            if residual < best_residual {
                best = entry;
                best_residual = residual;
            }
        }

        Ok(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Vec<FactionMatchup> {
        vec![
            FactionMatchup::new("Empire", "Sturgia", 12.0),
            FactionMatchup::new("Vlandia", "Battania", -8.0),
            FactionMatchup::new("Aserai", "Khuzait", 0.0),
            FactionMatchup::new("Sturgia", "Vlandia", -30.0),
            FactionMatchup::new("Battania", "Empire", 8.0),
        ]
    }

    #[test]
    fn test_single_entry_always_selected() {
        let single = vec![FactionMatchup::new("Empire", "Aserai", 4.5)];
        for margin in [-1000.0, -4.5, 0.0, 3.0, 250.0] {
            let chosen = MatchupSelector::new().select(margin, &single).unwrap();
            assert_eq!(chosen, &single[0]);
        }
    }

    #[test]
    fn test_positive_margin_takes_negative_differential() {
        let table = table();
        let chosen = MatchupSelector::new().select(25.0, &table).unwrap();
        assert_eq!(chosen.faction_a, "Sturgia");
        assert_eq!(chosen.win_differential, -30.0);
    }

    #[test]
    fn test_zero_margin_takes_neutral_pairing() {
        let table = table();
        let chosen = MatchupSelector::new().select(0.0, &table).unwrap();
        assert_eq!(chosen.faction_a, "Aserai");
    }

    #[test]
    fn test_ties_keep_first_entry() {
        let table = table();
        // residuals 16, 4, 4, 26, 12
        let chosen = MatchupSelector::new().select(4.0, &table).unwrap();
        assert_eq!(chosen.faction_a, "Vlandia");

        let tied = vec![
            FactionMatchup::new("A", "B", 5.0),
            FactionMatchup::new("C", "D", -5.0),
        ];
        let chosen = MatchupSelector::new().select(0.0, &tied).unwrap();
        assert_eq!(chosen.faction_a, "A");
    }

    #[test]
    fn test_empty_table_is_configuration_error() {
        let result = MatchupSelector::new().select(10.0, &[]);
        assert!(matches!(result, Err(MatchmakingError::EmptyFactionTable)));
    }
}
