/////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// TESTS
//////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use crate::Chemistry::composition::Composition;
    use crate::Chemistry::periodic_table::Element;
    use crate::Chemistry::reaction::BalancedReaction;
    use crate::Electrochem::conversion_electrode::ConversionElectrode;
    use crate::Electrochem::conversion_voltage_pair::{
        ConversionVoltagePair, ElectrodeError, AVOGADRO, ELECTRON_TO_AMPERE_HOURS,
    };
    use crate::PhaseEq::diagram::StoredDiagram;
    use crate::PhaseEq::entries::PhaseEntry;
    use crate::PhaseEq::profile::{EquilibriumStep, InsertionProfile};
    use approx::assert_relative_eq;

    fn comp(f: &str) -> Composition {
        Composition::from_formula(f).unwrap()
    }

    fn el(s: &str) -> Element {
        Element::from_symbol(s).unwrap()
    }

    fn fef3_entries() -> (PhaseEntry, PhaseEntry, PhaseEntry, PhaseEntry, PhaseEntry) {
        (
            PhaseEntry::new(comp("FeF3"), -20.0, 30.0),
            PhaseEntry::new(comp("FeF2"), -12.0, 25.0),
            PhaseEntry::new(comp("LiF"), -8.0, 10.0),
            PhaseEntry::new(comp("Fe"), -5.0, 8.0),
            PhaseEntry::new(comp("Li"), 0.0, 20.0),
        )
    }

    /// Lithiation of FeF3, ordered charged -> discharged:
    /// FeF3 -> LiF + FeF2 -> 3 LiF + Fe at chempots -1, -2, -3 eV.
    fn fef3_profile() -> Vec<EquilibriumStep> {
        let (fef3, fef2, lif, fe, li) = fef3_entries();
        let rxn0 = BalancedReaction::new(
            vec![(comp("FeF3"), 1.0)],
            vec![(comp("FeF3"), 1.0)],
        )
        .unwrap();
        let rxn1 = BalancedReaction::new(
            vec![(comp("FeF3"), 1.0), (comp("Li"), 1.0)],
            vec![(comp("LiF"), 1.0), (comp("FeF2"), 1.0)],
        )
        .unwrap();
        let rxn2 = BalancedReaction::new(
            vec![(comp("FeF3"), 1.0), (comp("Li"), 3.0)],
            vec![(comp("LiF"), 3.0), (comp("Fe"), 1.0)],
        )
        .unwrap();
        vec![
            EquilibriumStep::new(-1.0, 0.0, li.clone(), rxn0, vec![fef3]),
            EquilibriumStep::new(-2.0, 1.0, li.clone(), rxn1, vec![lif.clone(), fef2]),
            EquilibriumStep::new(-3.0, 3.0, li, rxn2, vec![lif, fe]),
        ]
    }

    fn fef3_electrode() -> ConversionElectrode {
        let (_, _, _, _, li) = fef3_entries();
        ConversionElectrode::new(fef3_profile(), li, comp("FeF3")).unwrap()
    }

    #[test]
    fn test_voltage_pair_from_steps() {
        let profile = fef3_profile();
        let norm = vec![(el("Fe"), 1.0), (el("F"), 3.0)];
        let pair = ConversionVoltagePair::new(&profile[0], &profile[1], &norm).unwrap();

        assert_relative_eq!(pair.voltage(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(
            pair.mAh(),
            ELECTRON_TO_AMPERE_HOURS * 1000.0,
            epsilon = 1e-9
        );
        assert_eq!(pair.working_ion_symbol(), "Li");

        let second = ConversionVoltagePair::new(&profile[1], &profile[2], &norm).unwrap();
        assert_relative_eq!(second.voltage(), 2.0, epsilon = 1e-9);
        assert_relative_eq!(second.mAh() / pair.mAh(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_pair_masses_and_volumes() {
        let profile = fef3_profile();
        let norm = vec![(el("Fe"), 1.0), (el("F"), 3.0)];
        let pair = ConversionVoltagePair::new(&profile[0], &profile[1], &norm).unwrap();

        // charged side: FeF3 -> FeF3, half the summed formula weights
        let w_fef3 = comp("FeF3").weight();
        assert_relative_eq!(pair.mass_charge(), w_fef3, epsilon = 1e-9);
        // discharged side: FeF3 + Li -> LiF + FeF2
        let w_dis =
            (w_fef3 + comp("Li").weight() + comp("LiF").weight() + comp("FeF2").weight()) / 2.0;
        assert_relative_eq!(pair.mass_discharge(), w_dis, epsilon = 1e-9);

        assert_relative_eq!(pair.vol_charge(), 30.0, epsilon = 1e-9);
        assert_relative_eq!(pair.vol_discharge(), 10.0 + 25.0, epsilon = 1e-9);

        assert_relative_eq!(pair.frac_charge(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(pair.frac_discharge(), 0.2, epsilon = 1e-12);

        let second = ConversionVoltagePair::new(&profile[1], &profile[2], &norm).unwrap();
        assert_relative_eq!(second.vol_discharge(), 3.0 * 10.0 + 8.0, epsilon = 1e-9);
        assert_relative_eq!(second.frac_discharge(), 3.0 / 7.0, epsilon = 1e-12);
    }

    #[test]
    fn test_pair_entry_sets_and_reaction() {
        let profile = fef3_profile();
        let norm = vec![(el("Fe"), 1.0), (el("F"), 3.0)];
        let pair = ConversionVoltagePair::new(&profile[0], &profile[1], &norm).unwrap();

        // assemblages swap sides: the discharged step holds the charged set
        assert_eq!(pair.entries_charge().len(), 2);
        assert_eq!(pair.entries_charge()[0].reduced_formula(), "LiF");
        assert_eq!(pair.entries_discharge().len(), 1);
        assert_eq!(pair.entries_discharge()[0].reduced_formula(), "FeF3");

        let rxn = pair.reaction();
        assert_relative_eq!(
            rxn.coefficient(&comp("FeF3")).unwrap(),
            -1.0,
            epsilon = 1e-9
        );
        assert_relative_eq!(rxn.coefficient(&comp("Li")).unwrap(), -1.0, epsilon = 1e-9);
        assert_relative_eq!(rxn.coefficient(&comp("LiF")).unwrap(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(rxn.coefficient(&comp("FeF2")).unwrap(), 1.0, epsilon = 1e-9);

        let sig = pair.reaction_signature();
        assert!(sig.contains("FeF3") && sig.contains("Li") && sig.contains("LiF"));
    }

    #[test]
    fn test_normalization_follows_bulk_amounts() {
        let (_, _, _, _, li) = fef3_entries();
        // Fe2F6 reduces to FeF3 but normalizes the pair reactions to 2 Fe
        let electrode = ConversionElectrode::new(fef3_profile(), li, comp("Fe2F6")).unwrap();
        let rxn = electrode.voltage_pairs()[0].reaction();
        assert_relative_eq!(rxn.element_amount(el("Fe")), 2.0, epsilon = 1e-9);
        assert_relative_eq!(
            rxn.coefficient(&comp("FeF3")).unwrap(),
            -2.0,
            epsilon = 1e-9
        );
        // capacity stays per formula unit of the profile, not rescaled
        assert_relative_eq!(
            electrode.voltage_pairs()[0].mAh(),
            ELECTRON_TO_AMPERE_HOURS * 1000.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_electrode_aggregates() {
        let electrode = fef3_electrode();
        assert_eq!(electrode.num_steps(), 2);
        assert_eq!(electrode.working_ion_symbol(), "Li");

        // capacity-weighted: (1 V * 1 mol + 2 V * 2 mol) / 3 mol
        assert_relative_eq!(electrode.average_voltage(), 5.0 / 3.0, epsilon = 1e-9);
        assert_relative_eq!(electrode.min_voltage(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(electrode.max_voltage(), 2.0, epsilon = 1e-9);

        let total_mah = 3.0 * ELECTRON_TO_AMPERE_HOURS * 1000.0;
        let grav = total_mah / comp("FeF3").weight();
        assert_relative_eq!(electrode.capacity_grav(), grav, epsilon = 1e-9);
        // the real-world figure for FeF3 lithiation, a useful cross-check
        assert_relative_eq!(electrode.capacity_grav(), 712.5, epsilon = 0.5);

        let vol = total_mah / 30.0 * 1.0e24 / AVOGADRO;
        assert_relative_eq!(electrode.capacity_vol(), vol, epsilon = 1e-9);

        assert_relative_eq!(
            electrode.specific_energy(),
            5.0 / 3.0 * grav,
            epsilon = 1e-9
        );
        assert_relative_eq!(electrode.energy_density(), 5.0 / 3.0 * vol, epsilon = 1e-9);

        println!("{}", electrode);
        electrode.pretty_print();
    }

    #[test]
    fn test_sub_electrodes() {
        let electrode = fef3_electrode();
        let adjacent = electrode.sub_electrodes(true, false).unwrap();
        assert_eq!(adjacent.len(), 2);
        assert!(adjacent.iter().all(|e| e.num_steps() == 1));
        assert_relative_eq!(adjacent[0].average_voltage(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(adjacent[1].average_voltage(), 2.0, epsilon = 1e-9);

        let all = electrode.sub_electrodes(false, true).unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.iter().any(|e| e.num_steps() == 2));
    }

    #[test]
    fn test_signature_comparison() {
        let electrode = fef3_electrode();
        let twin = fef3_electrode();
        assert!(electrode.is_same_electrode(&twin));
        assert!(electrode.is_super_electrode(&twin));

        let subs = electrode.sub_electrodes(true, false).unwrap();
        assert!(electrode.is_super_electrode(&subs[0]));
        assert!(electrode.is_super_electrode(&subs[1]));
        assert!(!subs[0].is_super_electrode(&electrode));
        assert!(!electrode.is_same_electrode(&subs[0]));
        assert!(!subs[0].is_same_electrode(&subs[1]));
    }

    #[test]
    fn test_from_composition_and_pd() {
        let (fef3, fef2, lif, fe, li) = fef3_entries();
        // stored in analyzer order, most reduced state first
        let mut steps = fef3_profile();
        steps.reverse();
        let profiles = vec![InsertionProfile::new("Li", "FeF3", steps)];
        let pd = StoredDiagram::from_entries(vec![fef3, fef2, lif, fe, li], profiles);

        let electrode = ConversionElectrode::from_composition_and_pd(&comp("FeF3"), &pd, "Li")
            .unwrap()
            .unwrap();
        assert_eq!(electrode.num_steps(), 2);
        assert_relative_eq!(
            electrode.voltage_pairs()[0].voltage(),
            1.0,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            electrode.voltage_pairs()[1].voltage(),
            2.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_from_composition_and_entries() {
        let (fef3, fef2, lif, fe, li) = fef3_entries();
        let mut steps = fef3_profile();
        steps.reverse();
        let electrode = ConversionElectrode::from_composition_and_entries(
            &comp("Fe2F6"),
            vec![fef3, fef2, lif, fe, li],
            vec![InsertionProfile::new("Li", "FeF3", steps)],
            "Li",
        )
        .unwrap()
        .unwrap();
        assert_eq!(electrode.num_steps(), 2);
        assert_eq!(electrode.composition().reduced_formula(), "FeF3");
    }

    #[test]
    fn test_single_step_profile_gives_none() {
        let (fef3, fef2, lif, fe, li) = fef3_entries();
        let steps = vec![fef3_profile().remove(2)];
        let profiles = vec![InsertionProfile::new("Li", "FeF3", steps)];
        let pd = StoredDiagram::from_entries(vec![fef3, fef2, lif, fe, li], profiles);
        let out = ConversionElectrode::from_composition_and_pd(&comp("FeF3"), &pd, "Li").unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn test_missing_target_or_ion_entry() {
        let (fef3, fef2, lif, fe, li) = fef3_entries();
        let mut steps = fef3_profile();
        steps.reverse();
        let profiles = vec![InsertionProfile::new("Li", "FeF3", steps)];

        // no stable FeF3 entry at all
        let pd = StoredDiagram::from_entries(
            vec![fef2.clone(), lif.clone(), fe.clone(), li.clone()],
            profiles.clone(),
        );
        let err =
            ConversionElectrode::from_composition_and_pd(&comp("FeF3"), &pd, "Li").unwrap_err();
        assert!(matches!(err, ElectrodeError::NotFound(_)));

        // no elemental entry for the working ion
        let pd = StoredDiagram::from_entries(vec![fef3, fef2, lif, fe], profiles);
        let err =
            ConversionElectrode::from_composition_and_pd(&comp("FeF3"), &pd, "Li").unwrap_err();
        assert!(matches!(err, ElectrodeError::NotFound(_)));
    }

    #[test]
    fn test_missing_profile_maps_to_not_found() {
        let (fef3, fef2, lif, fe, li) = fef3_entries();
        let pd = StoredDiagram::from_entries(vec![fef3, fef2, lif, fe, li], vec![]);
        let err =
            ConversionElectrode::from_composition_and_pd(&comp("FeF3"), &pd, "Li").unwrap_err();
        assert!(matches!(err, ElectrodeError::NotFound(_)));
    }

    #[test]
    fn test_decreasing_evolution_is_rejected() {
        let profile = fef3_profile();
        let norm = vec![(el("Fe"), 1.0), (el("F"), 3.0)];
        let err = ConversionVoltagePair::new(&profile[1], &profile[0], &norm).unwrap_err();
        assert!(matches!(err, ElectrodeError::InvariantViolation(_)));
    }

    #[test]
    fn test_non_elemental_ion_reference_is_rejected() {
        let (fef3, fef2, lif, _, _) = fef3_entries();
        let rxn = BalancedReaction::new(
            vec![(comp("FeF3"), 1.0), (comp("Li"), 1.0)],
            vec![(comp("LiF"), 1.0), (comp("FeF2"), 1.0)],
        )
        .unwrap();
        let s1 = EquilibriumStep::new(-1.0, 0.0, lif.clone(), rxn.clone(), vec![fef3]);
        let s2 = EquilibriumStep::new(-2.0, 1.0, lif.clone(), rxn, vec![fef2]);
        let norm = vec![(el("Fe"), 1.0)];
        let err = ConversionVoltagePair::new(&s1, &s2, &norm).unwrap_err();
        assert!(matches!(err, ElectrodeError::Configuration(_)));

        let err = ConversionElectrode::new(vec![s1, s2], lif, comp("FeF3")).unwrap_err();
        assert!(matches!(err, ElectrodeError::Configuration(_)));
    }

    #[test]
    fn test_too_short_profile_is_a_configuration_error() {
        let (_, _, _, _, li) = fef3_entries();
        let mut profile = fef3_profile();
        profile.truncate(1);
        let err = ConversionElectrode::new(profile, li, comp("FeF3")).unwrap_err();
        assert!(matches!(err, ElectrodeError::Configuration(_)));
    }

    #[test]
    fn test_profile_serde_round_trip_is_exact() {
        let mut steps = fef3_profile();
        steps.reverse();
        let profile = InsertionProfile::new("Li", "FeF3", steps);
        let json = serde_json::to_string(&profile).unwrap();
        let restored: InsertionProfile = serde_json::from_str(&json).unwrap();

        let (_, _, _, _, li) = fef3_entries();
        let mut original_steps = restored.steps.clone();
        original_steps.reverse();
        let electrode = ConversionElectrode::new(original_steps, li.clone(), comp("FeF3")).unwrap();
        let reference = fef3_electrode();

        assert_eq!(restored.working_ion, "Li");
        assert_eq!(restored.steps.len(), 3);
        for (a, b) in electrode
            .voltage_pairs()
            .iter()
            .zip(reference.voltage_pairs())
        {
            assert!(a.voltage() == b.voltage());
            assert!(a.mAh() == b.mAh());
            assert!(a.mass_charge() == b.mass_charge());
            assert!(a.vol_discharge() == b.vol_discharge());
        }
        assert!(electrode.is_same_electrode(&reference));
    }
}
