use piscari::adaptation::{
    adapt_fleet, Acceptance, Adaptation, CandidateRule, CashFlow, NeighborRule, ShortHistory,
};
use piscari::errors::Error;
use piscari::market::Market;
use piscari::model::{Fisher, Fishery, Gear, Species};
use piscari::regulation::Regulation;
use piscari::stock::Stock;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;

fn fleet_fishery(fishers: Vec<Fisher>) -> Fishery {
    Fishery::new(
        vec![Species { name: "North".into() }],
        fishers,
        Stock::Fixed { cpue: vec![5.0] },
        Market::Fixed { prices: vec![2.0] },
        Regulation::OpenAccess,
        0.0,
    )
}

/// A fisher whose cash history runs through the given closing balances.
fn fisher_with_history(gear: Gear, history: &[f64]) -> Fisher {
    let mut fisher = Fisher::new(gear, 1);
    let mut previous = 0.0;
    for &cash in history {
        fisher.credit(cash - previous);
        fisher.record_cash();
        previous = cash;
    }
    fisher
}

fn imitator(objective: CashFlow) -> Adaptation {
    Adaptation::new(
        0.0,
        1.0,
        CandidateRule::Discrete { options: vec![Gear::new(vec![1.0])] },
        NeighborRule::Uniform,
        objective,
        Acceptance::Any,
    )
    .expect("failed to build adaptation")
}

fn explorer(options: Vec<Gear>, acceptance: Acceptance) -> Adaptation {
    Adaptation::new(
        1.0,
        0.0,
        CandidateRule::Discrete { options },
        NeighborRule::Uniform,
        CashFlow { window: 1, short_history: ShortHistory::Stay },
        acceptance,
    )
    .expect("failed to build adaptation")
}

#[test]
fn cash_flow_is_the_trailing_window_difference() {
    let fisher = fisher_with_history(Gear::new(vec![1.0]), &[0.0, 1.0, 3.0, 6.0, 10.0]);

    let narrow = CashFlow { window: 2, short_history: ShortHistory::Stay };
    assert_eq!(narrow.own_fitness(&fisher), Some(7.0));

    let wide = CashFlow { window: 4, short_history: ShortHistory::Stay };
    assert_eq!(wide.own_fitness(&fisher), Some(10.0));
}

#[test]
fn short_history_policy_decides_evaluability() {
    let fisher = fisher_with_history(Gear::new(vec![1.0]), &[0.0, 1.0, 3.0]);

    let stay = CashFlow { window: 10, short_history: ShortHistory::Stay };
    assert_eq!(stay.own_fitness(&fisher), None);

    let truncate = CashFlow { window: 10, short_history: ShortHistory::Truncate };
    assert_eq!(truncate.own_fitness(&fisher), Some(3.0));

    // A single reading supports no flow under either policy.
    let newcomer = fisher_with_history(Gear::new(vec![1.0]), &[5.0]);
    assert_eq!(stay.own_fitness(&newcomer), None);
    assert_eq!(truncate.own_fitness(&newcomer), None);
}

#[test]
fn imitation_adopts_a_strictly_better_peer() {
    let gear_a = Gear::new(vec![1.0]);
    let gear_b = Gear::new(vec![2.0]);
    let fishery = fleet_fishery(vec![
        fisher_with_history(gear_a.clone(), &[0.0, 1.0]),
        fisher_with_history(gear_b.clone(), &[0.0, 5.0]),
    ]);
    let adaptation = imitator(CashFlow { window: 1, short_history: ShortHistory::Stay });
    let mut rng = ChaCha12Rng::seed_from_u64(1);

    // In a fleet of two the sampled peer is the other fisher.
    let decision = adaptation.decide(0, &fishery, &mut rng).expect("failed to decide");
    assert_eq!(decision, Some(gear_b));

    let decision = adaptation.decide(1, &fishery, &mut rng).expect("failed to decide");
    assert_eq!(decision, None);
}

#[test]
fn an_exact_tie_keeps_the_current_gear() {
    let fishery = fleet_fishery(vec![
        fisher_with_history(Gear::new(vec![1.0]), &[0.0, 4.0]),
        fisher_with_history(Gear::new(vec![2.0]), &[0.0, 4.0]),
    ]);
    let adaptation = imitator(CashFlow { window: 1, short_history: ShortHistory::Stay });
    let mut rng = ChaCha12Rng::seed_from_u64(1);

    let decision = adaptation.decide(0, &fishery, &mut rng).expect("failed to decide");
    assert_eq!(decision, None);
}

#[test]
fn exploration_rates_a_candidate_by_its_holders() {
    let gear_a = Gear::new(vec![1.0]);
    let gear_b = Gear::new(vec![2.0]);
    let fishery = fleet_fishery(vec![
        fisher_with_history(gear_a.clone(), &[0.0, 1.0]),
        fisher_with_history(gear_b.clone(), &[0.0, 3.0]),
        fisher_with_history(gear_b.clone(), &[0.0, 7.0]),
    ]);
    let mut rng = ChaCha12Rng::seed_from_u64(1);

    // The holders of the candidate average a flow of 5.0 against an own 1.0.
    let adaptation = explorer(vec![gear_b.clone()], Acceptance::Any);
    let decision = adaptation.decide(0, &fishery, &mut rng).expect("failed to decide");
    assert_eq!(decision, Some(gear_b));

    // A candidate nobody holds has no fitness and the fisher stays put.
    let unheld = explorer(vec![Gear::new(vec![3.0])], Acceptance::Any);
    let decision = unheld.decide(0, &fishery, &mut rng).expect("failed to decide");
    assert_eq!(decision, None);
}

#[test]
fn acceptance_filters_the_candidate_before_fitness() {
    let gear_a = Gear::new(vec![1.0]);
    let gear_b = Gear::new(vec![2.0]);
    let fishery = fleet_fishery(vec![
        fisher_with_history(gear_a.clone(), &[0.0, 1.0]),
        fisher_with_history(gear_b.clone(), &[0.0, 5.0]),
    ]);
    let mut rng = ChaCha12Rng::seed_from_u64(1);

    let capped = explorer(vec![gear_b.clone()], Acceptance::MaxCatchability { limit: 1.5 });
    let decision = capped.decide(0, &fishery, &mut rng).expect("failed to decide");
    assert_eq!(decision, None);

    // The same cap also vetoes imitating a peer whose gear exceeds it.
    let adaptation = Adaptation::new(
        0.0,
        1.0,
        CandidateRule::Discrete { options: vec![gear_a] },
        NeighborRule::Uniform,
        CashFlow { window: 1, short_history: ShortHistory::Stay },
        Acceptance::MaxCatchability { limit: 1.5 },
    )
    .expect("failed to build adaptation");
    let decision = adaptation.decide(0, &fishery, &mut rng).expect("failed to decide");
    assert_eq!(decision, None);
}

#[test]
fn the_fleet_pass_decides_against_the_pre_pass_fleet() {
    let gear_a = Gear::new(vec![1.0]);
    let gear_b = Gear::new(vec![2.0]);
    let gear_c = Gear::new(vec![3.0]);
    let mut fishery = fleet_fishery(vec![
        fisher_with_history(gear_c, &[0.0, -2.0]),
        fisher_with_history(gear_b, &[0.0, 4.0]),
        fisher_with_history(gear_a.clone(), &[0.0, 9.0]),
    ]);

    // Both movers explore the third fisher's gear. Were swaps applied as
    // they are decided, the first mover's adoption would drag the holder
    // mean to 3.5 and veto the second mover; against the pre-pass fleet the
    // candidate carries the lone holder's 9.0 and both adopt.
    fishery.fishers_mut()[0]
        .set_adaptation(Some(explorer(vec![gear_a.clone()], Acceptance::Any)));
    fishery.fishers_mut()[1]
        .set_adaptation(Some(explorer(vec![gear_a.clone()], Acceptance::Any)));

    let mut rng = ChaCha12Rng::seed_from_u64(1);
    adapt_fleet(&mut fishery, &mut rng).expect("failed to adapt fleet");

    assert_eq!(fishery.fishers()[0].gear(), &gear_a);
    assert_eq!(fishery.fishers()[1].gear(), &gear_a);
    assert_eq!(fishery.fishers()[2].gear(), &gear_a);
}

#[test]
fn a_lone_fisher_has_nobody_to_imitate() {
    let fishery = fleet_fishery(vec![
        fisher_with_history(Gear::new(vec![1.0]), &[0.0, 1.0]),
    ]);
    let adaptation = imitator(CashFlow { window: 1, short_history: ShortHistory::Stay });
    let mut rng = ChaCha12Rng::seed_from_u64(1);

    let decision = adaptation.decide(0, &fishery, &mut rng).expect("failed to decide");
    assert_eq!(decision, None);

    assert_eq!(NeighborRule::Uniform.sample(0, 1, &mut rng), None);
    assert_eq!(NeighborRule::Ring { span: 1 }.sample(0, 2, &mut rng), Some(1));
    assert_eq!(NeighborRule::Ring { span: 1 }.sample(1, 2, &mut rng), Some(0));
}

#[test]
fn perturbation_never_reaches_an_untargeted_species() {
    let gear = Gear::new(vec![0.5, 0.0]);
    let mut rng = ChaCha12Rng::seed_from_u64(3);

    let frozen = CandidateRule::Perturb { sigma: 0.0, match_tol: 0.0 };
    let candidate = frozen.propose(&gear, &mut rng).expect("failed to propose");
    assert_eq!(candidate, gear);

    let jittered = CandidateRule::Perturb { sigma: 0.3, match_tol: 0.0 };
    let candidate = jittered.propose(&gear, &mut rng).expect("failed to propose");
    assert_eq!(candidate.catchability(1), 0.0);
    assert!(candidate.catchability(0) > 0.0);
}

#[test]
fn an_empty_candidate_list_is_a_configuration_error() {
    let gear = Gear::new(vec![1.0]);
    let mut rng = ChaCha12Rng::seed_from_u64(1);
    let empty = CandidateRule::Discrete { options: Vec::new() };
    assert!(matches!(empty.propose(&gear, &mut rng), Err(Error::Configuration(_))));
}

#[test]
fn decision_probabilities_must_form_a_distribution() {
    let candidates = || CandidateRule::Discrete { options: vec![Gear::new(vec![1.0])] };
    let objective = CashFlow { window: 1, short_history: ShortHistory::Stay };

    let result = Adaptation::new(0.7, 0.4, candidates(), NeighborRule::Uniform, objective, Acceptance::Any);
    assert!(matches!(result, Err(Error::Configuration(_))));

    let result = Adaptation::new(1.2, 0.0, candidates(), NeighborRule::Uniform, objective, Acceptance::Any);
    assert!(matches!(result, Err(Error::Configuration(_))));
}
