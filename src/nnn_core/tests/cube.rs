use log::info;
use nnn_core::{
    Config, Cube, CubeError, Face, Move, Turn,
    edge_slots::{EDGE_SLOTS, oll_flip_moves, pll_setup, pll_swap_moves},
    moves_to_string, parse_moves, random_moves, reverse_steps,
    solution::{CENTERS_SOLVED, EDGES_GROUPED},
};

#[test_log::test]
fn test_fixed_scramble_then_reverse() {
    let scramble =
        parse_moves("Rw U2 Fw' D L2 2B R' Uw2 F B' 3Lw D2 Rw' U' 2F2 L Dw B2 R2 Fw").unwrap();
    assert_eq!(scramble.len(), 20);

    let mut cube = Cube::new(4).unwrap();
    cube.rotate_moves(&scramble).unwrap();
    assert!(!cube.solved());
    cube.rotate_moves(&reverse_steps(&scramble)).unwrap();
    assert!(cube.solved());
    assert_eq!(cube.solution().len_minus_rotations(4), 40);
}

fn inject_pll(cube: &mut Cube, a: usize, b: usize) {
    let setup = pll_setup(a, b).unwrap().to_vec();
    cube.rotate_moves(&setup).unwrap();
    cube.rotate_moves(&pll_swap_moves(cube.size())).unwrap();
    cube.rotate_moves(&reverse_steps(&setup)).unwrap();
}

#[test_log::test]
fn test_pll_parity_is_predicted_and_fixed() {
    for size in [4, 6] {
        for a in 0..EDGE_SLOTS.len() {
            for b in a + 1..EDGE_SLOTS.len() {
                let mut cube = Cube::new(size).unwrap();
                inject_pll(&mut cube, a, b);
                assert!(cube.edge_solution_leads_to_pll_parity(false).unwrap());
                assert!(cube.corner_swaps_even().unwrap());
                cube.solve_pll().unwrap();
                assert!(cube.solved(), "{} {} on {size}", EDGE_SLOTS[a].name, EDGE_SLOTS[b].name);
            }
        }
    }
}

#[test_log::test]
fn test_pll_prediction_follows_corner_parity() {
    // Outer turns on a reduced cube never create PLL parity, whatever they do
    // to the corners.
    let mut rng = fastrand::Rng::with_seed(7);
    for size in [4, 6] {
        for _ in 0..20 {
            let mut cube = Cube::new(size).unwrap();
            let scramble = random_moves(3, 15, &mut rng);
            cube.rotate_moves(&scramble).unwrap();
            let corners_even = cube.corner_swaps_even().unwrap();
            assert_eq!(
                cube.edge_swaps_even(true, None, false).unwrap(),
                corners_even,
                "{}",
                moves_to_string(&scramble)
            );
            assert!(!cube.edge_solution_leads_to_pll_parity(false).unwrap());

            inject_pll(&mut cube, 0, 11);
            assert!(cube.edge_solution_leads_to_pll_parity(false).unwrap());
        }
    }
}

#[test_log::test]
fn test_oll_parity_is_predicted_and_fixed() {
    for (size, orbits) in [(4, vec![0]), (6, vec![0, 1])] {
        let mut cube = Cube::new(size).unwrap();
        cube.rotate_str("R U R' F2 D").unwrap();
        cube.rotate_moves(&oll_flip_moves(size)).unwrap();
        cube.rotate_str("D' F2 R U' R'").unwrap();

        assert_eq!(cube.center_solution_leads_to_oll_parity(false).unwrap(), orbits);
        assert_eq!(cube.misoriented_dedges().unwrap().len(), 1);
        assert_eq!(cube.solve_oll().unwrap(), 1);
        assert!(cube.solved());
        assert!(cube.center_solution_leads_to_oll_parity(false).unwrap().is_empty());
    }
}

#[test_log::test]
fn test_odd_cube_with_flipped_dedge_is_an_error() {
    let mut cube = Cube::new(5).unwrap();
    let (face, dir) = (EDGE_SLOTS[2].face, EDGE_SLOTS[2].dir);
    let positions = cube.side(face).edge(dir).to_vec();
    let mut raw = cube.state_string().into_bytes();
    for position in positions {
        let partner = cube.wing_partner(position).unwrap();
        raw.swap(position - 1, partner - 1);
    }
    cube.load_state(std::str::from_utf8(&raw).unwrap(), nnn_core::FaceOrder::Ulfrbd)
        .unwrap();
    assert!(matches!(cube.solve_oll(), Err(CubeError::SolveError(_))));
}

fn normalized(mut cube: Cube) -> String {
    cube.rotate_u_to_u().unwrap();
    cube.rotate_f_to_f().unwrap();
    cube.state_string()
}

#[test_log::test]
fn test_compression_keeps_the_result() {
    let mut rng = fastrand::Rng::with_seed(35);
    let rotations = ["x", "y'", "z2", "x'", "y"];
    for size in [3, 5] {
        for _ in 0..10 {
            let mut cube = Cube::new(size).unwrap();
            for chunk in 0..6 {
                cube.rotate_moves(&random_moves(size, 5, &mut rng)).unwrap();
                cube.rotate_str(rotations[rng.usize(..rotations.len())]).unwrap();
                if chunk == 2 {
                    cube.solution_mut().push_marker(CENTERS_SOLVED);
                }
                if chunk == 4 {
                    cube.solution_mut().push_marker(EDGES_GROUPED);
                }
            }
            cube.rotate(Move::new(Face::D, size, Turn::Clockwise)).unwrap();

            let mut solution = cube.solution().clone();
            let stats = solution.compress(size);
            info!("compressed to {solution} with {stats:?}");
            assert_eq!(stats.rotations_removed, 7);
            assert_eq!(stats.phases.len(), 2);
            assert!(stats.total() <= 30);
            assert!(solution.moves().all(|mv| !mv.is_whole_cube(size)));

            let mut replay = Cube::new(size).unwrap();
            replay.rotate_moves(&solution.moves().collect::<Vec<_>>()).unwrap();
            assert_eq!(normalized(replay), normalized(cube));
        }
    }
}

#[test_log::test]
fn test_edge_swap_counting_leaves_the_cube_alone() {
    let mut rng = fastrand::Rng::with_seed(5);
    let mut cube = Cube::new(5).unwrap();
    assert_eq!(cube.get_edge_swap_count(false, None, true).unwrap(), 0);
    assert_eq!(cube.get_edge_swap_count(false, Some(0), false).unwrap(), 0);

    cube.rotate_moves(&random_moves(5, 40, &mut rng)).unwrap();
    let before = cube.snapshot();
    let first = cube.get_edge_swap_count(false, Some(0), false).unwrap();
    let again = cube.get_edge_swap_count(false, Some(0), false).unwrap();
    assert_eq!(first, again);
    assert_eq!(cube.snapshot(), before);
    assert!(cube.get_edge_swap_count(true, Some(0), false).is_err());
}

#[test_log::test]
fn test_config_sets_loop_cap() {
    let config = Config {
        max_loop_iterations: 1,
        ..Config::default()
    };
    let mut cube = Cube::with_config(4, &config, 0).unwrap();
    cube.rotate_str("x2").unwrap();
    // Two turns are needed and only one is allowed
    assert!(matches!(
        cube.rotate_u_to_u(),
        Err(CubeError::StuckInALoop { iterations: 1, .. })
    ));
}
