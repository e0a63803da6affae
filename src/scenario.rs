//! Scenario assembly: turn a validated config into a fishery, a populated
//! schedule and the standard data columns.
//!
//! Standard column names follow the species name: `"<species> landings"`,
//! `"<species> earnings"`, `"<species> quota remaining"`, `"<species> quota
//! price"`, `"<species> catchers"`, `"<species> biomass"` and `"fleet cash"`.
//! Landings and earnings are collected at both cadences; the rest where the
//! scenario gives them meaning.

use crate::adaptation::{Adaptation, CandidateRule, CashFlow};
use crate::collectors::{DataCollector, Probe};
use crate::config::{
    CandidateConfig, Config, GearConfig, MarketConfig, QuotaPriceConfig, RegulationConfig,
    StockConfig,
};
use crate::errors::{Error, Result};
use crate::market::Market;
use crate::model::{Fisher, Fishery, Gear, Species};
use crate::regulation::{QuotaLedger, QuotaPrice, QuotaPriceRule, Regulation};
use crate::schedule::{Action, Cadence, Schedule};
use crate::stock::Stock;

/// Build the world one engine run steps through.
///
/// The daily pass is dawn reset, harvest, the ITQ clearing session, stock
/// regrowth, the cash memory and then the daily gatherers. The yearly pass
/// is the yearly gatherers first, so they read the finished year, then
/// adaptation, the quota reset and the yearly counter reset.
pub fn assemble(cfg: &Config) -> Result<(Fishery, Schedule, DataCollector)> {
    let species: Vec<Species> = cfg
        .species
        .names
        .iter()
        .map(|name| Species { name: name.clone() })
        .collect();

    let fishery = Fishery::new(
        species,
        build_fleet(cfg)?,
        build_stock(&cfg.stock, cfg.run.days_per_year),
        build_market(&cfg.market),
        build_regulation(&cfg.regulation)?,
        cfg.fleet.luck_sigma,
    );

    let mut schedule = Schedule::new(cfg.run.steps_per_day, cfg.run.days_per_year);
    let mut data = DataCollector::default();

    schedule.register(Cadence::Daily, Action::Dawn);
    schedule.register(Cadence::Daily, Action::Harvest);
    if matches!(cfg.regulation, RegulationConfig::Itq { .. }) {
        schedule.register(Cadence::Daily, Action::QuotaMarket);
    }
    if matches!(cfg.stock, StockConfig::Logistic { .. }) {
        schedule.register(Cadence::Daily, Action::StockGrowth);
    }
    schedule.register(Cadence::Daily, Action::Memory);

    register_columns(cfg, &mut schedule, &mut data)?;

    if let Some(adaptation) = &cfg.adaptation {
        if adaptation.enabled {
            schedule.register(adaptation.cadence, Action::Adapt);
        }
    }
    if !matches!(cfg.regulation, RegulationConfig::Open) {
        schedule.register(Cadence::Yearly, Action::QuotaReset);
    }
    schedule.register(Cadence::Yearly, Action::YearEnd);

    Ok((fishery, schedule, data))
}

fn build_stock(cfg: &StockConfig, days_per_year: u64) -> Stock {
    match cfg {
        StockConfig::Fixed { cpue } => Stock::Fixed { cpue: cpue.clone() },
        StockConfig::Logistic { biomass, capacity, growth } => Stock::Logistic {
            biomass: biomass.clone(),
            capacity: capacity.clone(),
            growth: growth.iter().map(|g| g / days_per_year as f64).collect(),
        },
    }
}

fn build_market(cfg: &MarketConfig) -> Market {
    match cfg {
        MarketConfig::Fixed { prices } => Market::Fixed { prices: prices.clone() },
        MarketConfig::Congested { choke, slope } => {
            Market::Congested { choke: choke.clone(), slope: slope.clone() }
        }
    }
}

fn build_regulation(cfg: &RegulationConfig) -> Result<Regulation> {
    match cfg {
        RegulationConfig::Open => Ok(Regulation::OpenAccess),
        RegulationConfig::Tac { quotas } => Ok(Regulation::Tac {
            ledgers: quotas.iter().copied().map(QuotaLedger::new).collect(),
        }),
        RegulationConfig::Itq { quotas, price } => {
            let Some(price) = price else {
                return Err(Error::Configuration(
                    "regulation.price is required under the itq regime".into(),
                ));
            };
            let price_of = |_species: usize| match *price {
                QuotaPriceConfig::Additive { initial, step, floor, cap } => {
                    QuotaPrice::new(initial, floor, cap, QuotaPriceRule::Additive { step })
                }
                QuotaPriceConfig::Multiplicative { initial, rate, floor, cap } => {
                    QuotaPrice::new(initial, floor, cap, QuotaPriceRule::Multiplicative { rate })
                }
            };
            Ok(Regulation::Itq {
                allocation: quotas.clone(),
                prices: (0..quotas.len()).map(price_of).collect(),
            })
        }
    }
}

fn build_fleet(cfg: &Config) -> Result<Vec<Fisher>> {
    let n_species = cfg.n_species();
    let gear_of = |fisher: usize| match &cfg.fleet.gear {
        GearConfig::Uniform { catchability } => Gear::new(catchability.clone()),
        GearConfig::Split { options } => Gear::new(options[fisher % options.len()].clone()),
    };

    let adaptation = match &cfg.adaptation {
        Some(adaptation) if adaptation.enabled => Some(Adaptation::new(
            adaptation.exploration,
            adaptation.imitation,
            build_candidates(&adaptation.candidates),
            adaptation.neighbors,
            CashFlow {
                window: adaptation.objective.window,
                short_history: adaptation.objective.short_history,
            },
            adaptation.acceptance,
        )?),
        _ => None,
    };

    let mut fishers = Vec::with_capacity(cfg.fleet.n_fishers);
    for position in 0..cfg.fleet.n_fishers {
        let mut fisher = Fisher::new(gear_of(position), n_species);
        fisher.set_adaptation(adaptation.clone());
        fishers.push(fisher);
    }
    Ok(fishers)
}

fn build_candidates(cfg: &CandidateConfig) -> CandidateRule {
    match cfg {
        CandidateConfig::Discrete { options } => CandidateRule::Discrete {
            options: options.iter().cloned().map(Gear::new).collect(),
        },
        CandidateConfig::Perturb { sigma, match_tol } => {
            CandidateRule::Perturb { sigma: *sigma, match_tol: *match_tol }
        }
    }
}

fn gather(
    schedule: &mut Schedule,
    data: &mut DataCollector,
    cadence: Cadence,
    name: String,
    probe: Probe,
) -> Result<()> {
    let column = data.register(cadence, &name, probe, f64::NAN)?;
    schedule.register(cadence, Action::Gather { column });
    Ok(())
}

fn register_columns(
    cfg: &Config,
    schedule: &mut Schedule,
    data: &mut DataCollector,
) -> Result<()> {
    for (s, name) in cfg.species.names.iter().enumerate() {
        gather(schedule, data, Cadence::Daily, format!("{name} landings"), Probe::DailyLandings(s))?;
        gather(schedule, data, Cadence::Daily, format!("{name} earnings"), Probe::DailyEarnings(s))?;
        if !matches!(cfg.regulation, RegulationConfig::Open) {
            gather(
                schedule,
                data,
                Cadence::Daily,
                format!("{name} quota remaining"),
                Probe::QuotaRemaining(s),
            )?;
        }
        if matches!(cfg.regulation, RegulationConfig::Itq { .. }) {
            gather(
                schedule,
                data,
                Cadence::Daily,
                format!("{name} quota price"),
                Probe::QuotaPrice(s),
            )?;
        }
    }

    for (s, name) in cfg.species.names.iter().enumerate() {
        gather(schedule, data, Cadence::Yearly, format!("{name} landings"), Probe::YearlyLandings(s))?;
        gather(schedule, data, Cadence::Yearly, format!("{name} earnings"), Probe::YearlyEarnings(s))?;
        gather(schedule, data, Cadence::Yearly, format!("{name} catchers"), Probe::Catchers(s))?;
        if matches!(cfg.stock, StockConfig::Logistic { .. }) {
            gather(schedule, data, Cadence::Yearly, format!("{name} biomass"), Probe::Biomass(s))?;
        }
    }
    gather(schedule, data, Cadence::Yearly, "fleet cash".to_string(), Probe::FleetCash)?;

    Ok(())
}
