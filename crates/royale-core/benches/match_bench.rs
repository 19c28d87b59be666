use criterion::{black_box, criterion_group, criterion_main, Criterion};
use royale_core::analysis::simulate_placements;
use royale_core::{
    Catalog, MatchConfig, MatchEngine, MemoryStore, PointCurve, SeasonConfig, StagePhase, Team,
    TeamId, TournamentEngine,
};

fn lobby() -> Vec<Team> {
    let mut teams = vec![Team::new(TeamId::PLAYER, "Player", 55.0).as_player()];
    teams.extend((1..20).map(|i| Team::new(TeamId::new(i), format!("Team {i}"), 40.0 + f64::from(i))));
    teams
}

fn bench_full_match(c: &mut Criterion) {
    let teams = lobby();
    let mut seed = 0_u64;

    c.bench_function("full_match", |b| {
        b.iter(|| {
            seed = seed.wrapping_add(1);
            black_box(MatchEngine::new(teams.clone(), black_box(seed)).run())
        })
    });
}

fn bench_local_stage(c: &mut Criterion) {
    // Five lobbies plus roster building and verdict
    let mut seed = 0_u64;

    c.bench_function("local_stage", |b| {
        b.iter(|| {
            seed = seed.wrapping_add(1);
            let mut engine = TournamentEngine::new(
                SeasonConfig::default(),
                Catalog::builtin(),
                MemoryStore::new(),
                seed,
            )
            .unwrap();
            black_box(engine.run_stage(StagePhase::Local).unwrap())
        })
    });
}

fn bench_placement_analysis(c: &mut Criterion) {
    let teams = lobby();
    let config = MatchConfig::default();

    c.bench_function("placement_analysis_64", |b| {
        b.iter(|| black_box(simulate_placements(&teams, &config, PointCurve::Standard, 64, 7)))
    });
}

criterion_group!(benches, bench_full_match, bench_local_stage, bench_placement_analysis);
criterion_main!(benches);
