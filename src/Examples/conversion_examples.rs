use crate::Chemistry::composition::Composition;
use crate::Chemistry::reaction::BalancedReaction;
use crate::DataBank::provenance::{AnnotatedEntry, Author, HistoryNode};
use crate::DataBank::rest_client::RestAdaptor;
use crate::DataBank::schema::{load_document, save_document, DecodedDocument};
use crate::Electrochem::conversion_electrode::ConversionElectrode;
use crate::PhaseEq::entries::PhaseEntry;
use crate::PhaseEq::profile::{EquilibriumStep, InsertionProfile};
use crate::Utils::logging::init_console_logging;
use log::LevelFilter;
use serde_json::Map;

/// Lithiation of FeF3 with made-up but well-shaped energetics:
/// FeF3 -> LiF + FeF2 -> 3 LiF + Fe, ordered charged -> discharged.
fn fef3_profile() -> (Vec<EquilibriumStep>, PhaseEntry, Composition) {
    let comp = |f: &str| Composition::from_formula(f).unwrap();
    let fef3 = PhaseEntry::new(comp("FeF3"), -20.0, 30.0);
    let fef2 = PhaseEntry::new(comp("FeF2"), -12.0, 25.0);
    let lif = PhaseEntry::new(comp("LiF"), -8.0, 10.0);
    let fe = PhaseEntry::new(comp("Fe"), -5.0, 8.0);
    let li = PhaseEntry::new(comp("Li"), 0.0, 20.0);

    let rxn0 =
        BalancedReaction::new(vec![(comp("FeF3"), 1.0)], vec![(comp("FeF3"), 1.0)]).unwrap();
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
    let steps = vec![
        EquilibriumStep::new(-1.0, 0.0, li.clone(), rxn0, vec![fef3]),
        EquilibriumStep::new(-2.0, 1.0, li.clone(), rxn1, vec![lif.clone(), fef2]),
        EquilibriumStep::new(-3.0, 3.0, li.clone(), rxn2, vec![lif, fe]),
    ];
    (steps, li, comp("FeF3"))
}

pub fn conversion_examples(task: usize) {
    init_console_logging(LevelFilter::Info);
    match task {
        0 => {
            // electrode assembly and the aggregate figures
            let (steps, li, bulk) = fef3_profile();
            let electrode = ConversionElectrode::new(steps, li, bulk).unwrap();
            println!("{} \n", electrode);
            electrode.pretty_print();
            println!(
                "\n specific energy {:.1} Wh/kg, energy density {:.1} Wh/l",
                electrode.specific_energy(),
                electrode.energy_density()
            );
            for pair in electrode.voltage_pairs() {
                println!("step reaction: {}", pair.reaction());
            }
        }
        1 => {
            // decomposition into sub-electrodes
            let (steps, li, bulk) = fef3_profile();
            let electrode = ConversionElectrode::new(steps, li, bulk).unwrap();
            let adjacent = electrode.sub_electrodes(true, false).unwrap();
            println!("{} adjacent sub-electrode(s)", adjacent.len());
            for sub in &adjacent {
                println!(
                    "  {:.3} V over {:.1} mAh",
                    sub.average_voltage(),
                    sub.voltage_pairs()[0].mAh()
                );
                assert!(electrode.is_super_electrode(sub));
            }
            let all = electrode.sub_electrodes(false, false).unwrap();
            println!("{} contiguous sub-electrode(s) in total", all.len());
        }
        2 => {
            // tagged-document round trip through a file
            let (steps, _, _) = fef3_profile();
            let mut stored = steps;
            stored.reverse();
            let profile = InsertionProfile::new("Li", "FeF3", stored);
            let doc = DecodedDocument::Profile(profile);
            let file = tempfile::NamedTempFile::new().unwrap();
            let path = file.path().to_str().unwrap();
            save_document(&doc, path).unwrap();
            let back = load_document(path).unwrap();
            match back {
                DecodedDocument::Profile(p) => {
                    println!(
                        "round-tripped profile {} / {} with {} steps",
                        p.target_formula,
                        p.working_ion,
                        p.steps.len()
                    );
                }
                other => println!("unexpected document {:?}", other),
            }
        }
        3 => {
            // provenance wrapping of a computed entry
            let entry = PhaseEntry::with_id(
                Composition::from_formula("FeF3").unwrap(),
                -20.0,
                30.0,
                "db-1001",
            );
            let mut data = Map::new();
            data.insert("_screening".to_string(), serde_json::json!({"batch": 7}));
            let annotated = AnnotatedEntry::assemble(
                entry,
                vec![Author::new("John Doe", "jdoe@example.org")],
                vec!["conversion cathodes".to_string()],
                "@article{doe2026, title={Iron fluoride conversion}}",
                vec!["hand-built demo".to_string()],
                data,
                vec![HistoryNode::new(
                    "analyzer",
                    "https://databank.voltacell.org",
                    serde_json::json!({"scan": "Li chempot"}),
                )],
                "2026-08-21T12:00:00Z",
            )
            .unwrap();
            println!("{}", annotated);
            let json = serde_json::to_string_pretty(&annotated).unwrap();
            println!("{}", json);
        }
        4 => {
            // live databank fetch, needs a key in DATABANK_API_KEY
            match std::env::var("DATABANK_API_KEY") {
                Ok(key) => {
                    let adaptor = RestAdaptor::new(&key);
                    match adaptor.get_entries_in_chemsys(&["Li", "Fe", "F"]) {
                        Ok(entries) => {
                            println!("Li-Fe-F gave {} entries", entries.len());
                            for e in entries.iter().take(10) {
                                println!("  {}", e);
                            }
                        }
                        Err(e) => println!("databank request failed: {}", e),
                    }
                }
                Err(_) => println!("set DATABANK_API_KEY to run the live fetch demo"),
            }
        }
        _ => println!("no demo with number {}", task),
    }
}
