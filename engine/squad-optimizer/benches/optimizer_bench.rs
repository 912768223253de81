use criterion::{black_box, criterion_group, criterion_main, Criterion};
use squad_model::{Player, PlayerCatalogue, Position, Price, SquadRules};
use squad_optimizer::{Objective, OptimizeRequest, OptimizerConfig, SquadOptimizer, ValueTable};

fn catalogue() -> PlayerCatalogue {
    let positions = [Position::Keeper, Position::Defender, Position::Midfielder, Position::Forward];
    let players = (1..=500u32).map(|id| {
        let price = 40 + (id * 37 % 90) as i32;
        let position = positions[(id % 7 % 4) as usize];
        let projection = f64::from(price) / 20.0 + f64::from(id * 13 % 17) / 10.0;
        Player::new(id, &format!("Player {id}"), position, (id % 20) as u16, price)
            .with_projection(1, projection)
            .with_projection(2, projection * 0.8)
            .with_projection(3, projection * 1.1)
    });
    PlayerCatalogue::from_players(players).unwrap()
}

fn bench_fresh_build(c: &mut Criterion) {
    let catalogue = catalogue();
    let table = ValueTable::build(&catalogue, &[1, 2, 3]);
    let optimizer = SquadOptimizer::new(SquadRules::default(), OptimizerConfig::default()).unwrap();

    c.bench_function("fresh_build_500", |b| {
        b.iter(|| {
            let request = OptimizeRequest::fresh(
                &catalogue,
                &table,
                Price::from_tenths(1000),
                Objective::window(1, 3),
            );
            black_box(optimizer.optimize(&request)).unwrap();
        });
    });
}

fn bench_rank_moves(c: &mut Criterion) {
    let catalogue = catalogue();
    let table = ValueTable::build(&catalogue, &[1]);
    let optimizer = SquadOptimizer::new(SquadRules::default(), OptimizerConfig::default()).unwrap();
    let fresh =
        OptimizeRequest::fresh(&catalogue, &table, Price::from_tenths(1000), Objective::single(1));
    let squad = optimizer.optimize(&fresh).unwrap().squad;

    c.bench_function("rank_moves_top_10", |b| {
        b.iter(|| {
            let request =
                OptimizeRequest::transfers(&catalogue, &table, &squad, None, Objective::single(1));
            black_box(optimizer.rank_moves(&request, 10)).unwrap();
        });
    });
}

criterion_group!(benches, bench_fresh_build, bench_rank_moves);
criterion_main!(benches);
