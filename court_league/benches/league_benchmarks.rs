use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use court_league::tournament::{
    Match, MatchPhase, MatchStatus, SetScore, TeamId, compute_standings, evaluate,
    generate_fixtures, models::MAX_SETS, round_pairings,
};

const TOURNAMENT: i64 = 1;
const GROUP: i64 = 2;

fn teams(n: usize) -> Vec<TeamId> {
    (1..=n as TeamId).collect()
}

/// Every fixture of an `n`-team group with a plausible best-of-three score
fn scored_group(n: usize) -> (Vec<TeamId>, Vec<Match>) {
    let teams = teams(n);
    let matches = generate_fixtures(&teams)
        .into_iter()
        .enumerate()
        .map(|(i, f)| {
            // Alternate straight-set wins with three-setters
            let sets = if i % 2 == 0 {
                [SetScore::new(6, 3), SetScore::new(6, 4), SetScore::NOT_PLAYED]
            } else {
                [SetScore::new(4, 6), SetScore::new(7, 5), SetScore::new(3, 6)]
            };
            Match {
                id: i as i64 + 1,
                tournament_id: TOURNAMENT,
                group_id: GROUP,
                round: f.round,
                phase: MatchPhase::Group,
                team1: f.team1,
                team2: f.team2,
                sets,
                winner: None,
                status: MatchStatus::Completed,
                scheduled_at: None,
                venue: None,
            }
        })
        .collect();
    (teams, matches)
}

/// Benchmark evaluating one three-set match
fn bench_evaluate(c: &mut Criterion) {
    let sets: [SetScore; MAX_SETS] = [
        SetScore::new(6, 4),
        SetScore::new(3, 6),
        SetScore::new(7, 6),
    ];

    c.bench_function("evaluate_three_sets", |b| {
        b.iter(|| evaluate(&sets));
    });
}

/// Benchmark full fixture generation for different group sizes
fn bench_generate_fixtures(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_fixtures");

    for n_teams in [4, 5, 8, 16, 32].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_teams", n_teams)),
            n_teams,
            |b, &n| {
                let teams = teams(n);
                b.iter(|| generate_fixtures(&teams));
            },
        );
    }

    group.finish();
}

/// Benchmark computing a single round in isolation
fn bench_round_pairings(c: &mut Criterion) {
    let teams = teams(31);

    c.bench_function("round_pairings_31_teams", |b| {
        b.iter(|| round_pairings(&teams, 17));
    });
}

/// Benchmark a full standings recompute for different group sizes
fn bench_compute_standings(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_standings");

    for n_teams in [4, 8, 16, 32].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_teams", n_teams)),
            n_teams,
            |b, &n| {
                let (teams, matches) = scored_group(n);
                b.iter(|| compute_standings(TOURNAMENT, GROUP, &teams, &matches));
            },
        );
    }

    group.finish();
}

criterion_group!(
    scheduling,
    bench_generate_fixtures,
    bench_round_pairings,
);

criterion_group!(scoring, bench_evaluate, bench_compute_standings);

criterion_main!(scheduling, scoring);
