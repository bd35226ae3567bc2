use fireworks_show::firework_engine::config::RocketConfig;
use fireworks_show::firework_engine::explosion_cloud::velocity_scale;
use fireworks_show::firework_engine::rocket::{RocketUpdate, TrailPhase};
use fireworks_show::firework_engine::RocketState;
use fireworks_show::scene_engine::{MeshHandle, PhysicsBackend, SceneCommand, SoundCue};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::rc::Rc;

mod helpers;
use helpers::{advance, heart, recording_scene, seeded_rng, small_rocket_config, vertical_rocket};

// ==================================
// 1. Création
// ==================================

#[test]
fn test_created_rocket_holds_body_light_and_idle_trail() {
    let mut scene = recording_scene();
    let mut rng = seeded_rng();
    let rocket = vertical_rocket(&mut scene, &small_rocket_config(), &mut rng);

    assert_eq!(rocket.current_state(), RocketState::Created);
    assert_eq!(rocket.start_flight_time(), None);
    assert_eq!(rocket.start_explosion_time(), None);
    assert_eq!(rocket.trail_phase(), Some(TrailPhase::Emitting));

    let stats = scene.stats();
    assert_eq!(stats.bodies, 1);
    assert_eq!(stats.lights, 1);
    assert_eq!(stats.emitters, 1);
    assert_eq!(stats.running_emitters, 0, "trail must not run before launch");

    // La lumière reçoit la liste des maillages receveurs d'ombres
    assert!(scene
        .commands()
        .iter()
        .any(|c| matches!(c, SceneCommand::CreateLight(_, 2))));
}

#[test]
fn test_random_color_in_unit_cube() {
    let mut scene = recording_scene();
    let mut rng = seeded_rng();
    let config = small_rocket_config();

    for _ in 0..100 {
        let color = vertical_rocket(&mut scene, &config, &mut rng).color();
        for c in color.to_array() {
            assert!((0.0..1.0).contains(&c), "color component out of range: {}", c);
        }
    }
}

// ==================================
// 2. Lancement
// ==================================

#[test]
fn test_first_update_launches_and_records_flight_time() {
    let mut scene = recording_scene();
    let mut rng = seeded_rng();
    let config = small_rocket_config();
    let casters: Rc<[MeshHandle]> = Rc::from(Vec::new());
    // Direction non normalisée : seule son orientation compte
    let mut rocket = fireworks_show::Rocket::new(
        &mut scene,
        &config,
        &mut rng,
        Vec3::new(0.0, 2.0, 0.0),
        Vec3::ZERO,
        casters,
        heart(),
    );

    let outcome = rocket.update(500, &mut scene, &config, &mut rng);

    assert!(outcome.launched);
    assert_eq!(rocket.current_state(), RocketState::Fired);
    assert_eq!(rocket.start_flight_time(), Some(500));

    let body = rocket.body().unwrap();
    assert_eq!(scene.body_velocity(body), Some(Vec3::new(0.0, 10.0, 0.0)));
    assert_eq!(scene.stats().running_emitters, 1);

    let whistles: Vec<_> = scene
        .commands()
        .iter()
        .filter_map(|c| match c {
            SceneCommand::PlaySound(r) if r.cue == SoundCue::Whistle => Some(r.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(whistles.len(), 1);
    assert_eq!(whistles[0].attached_to, Some(body));
    assert_eq!(whistles[0].rolloff_factor, 40.0);
}

#[test]
fn test_flight_time_is_set_only_once() {
    let mut scene = recording_scene();
    let mut rng = seeded_rng();
    let config = small_rocket_config();
    let mut rocket = vertical_rocket(&mut scene, &config, &mut rng);

    advance(&mut rocket, &mut scene, 100, &config, &mut rng);
    for now in [200, 900, 1500] {
        advance(&mut rocket, &mut scene, now, &config, &mut rng);
        assert_eq!(rocket.start_flight_time(), Some(100));
    }
}

// ==================================
// 3. Traînée
// ==================================

#[test]
fn test_trail_slows_then_stops_at_flight_fractions() {
    let mut scene = recording_scene();
    let mut rng = seeded_rng();
    let config = small_rocket_config();
    let mut rocket = vertical_rocket(&mut scene, &config, &mut rng);
    let count = |scene: &fireworks_show::HeadlessScene, f: fn(&SceneCommand) -> bool| {
        scene.commands().iter().filter(|c| f(c)).count()
    };

    advance(&mut rocket, &mut scene, 0, &config, &mut rng);

    // 2/3 de 2000 ms = 1333.3 ms
    advance(&mut rocket, &mut scene, 1333, &config, &mut rng);
    assert_eq!(rocket.trail_phase(), Some(TrailPhase::Emitting));
    advance(&mut rocket, &mut scene, 1334, &config, &mut rng);
    assert_eq!(rocket.trail_phase(), Some(TrailPhase::Slowed));
    advance(&mut rocket, &mut scene, 1500, &config, &mut rng);
    assert_eq!(
        count(&scene, |c| matches!(c, SceneCommand::SetEmitterRate(..))),
        1,
        "trail must be slowed exactly once"
    );
    assert!(scene.commands().iter().any(|c| matches!(
        c,
        SceneCommand::SetEmitterRate(_, rate, life) if *rate == 100.0 && *life == (0.2..0.5)
    )));

    // 5/6 de 2000 ms = 1666.7 ms
    advance(&mut rocket, &mut scene, 1666, &config, &mut rng);
    assert_eq!(rocket.trail_phase(), Some(TrailPhase::Slowed));
    advance(&mut rocket, &mut scene, 1667, &config, &mut rng);
    assert_eq!(rocket.trail_phase(), Some(TrailPhase::Stopped));
    advance(&mut rocket, &mut scene, 1999, &config, &mut rng);
    assert_eq!(rocket.current_state(), RocketState::Fired);
    assert_eq!(count(&scene, |c| matches!(c, SceneCommand::StopEmitter(_))), 1);
    assert_eq!(count(&scene, |c| matches!(c, SceneCommand::DisposeEmitter(_))), 0);

    advance(&mut rocket, &mut scene, 2000, &config, &mut rng);
    assert_eq!(rocket.trail_phase(), None);
    assert_eq!(count(&scene, |c| matches!(c, SceneCommand::DisposeEmitter(_))), 1);
    assert_eq!(scene.stats().emitters, 0);
}

#[test]
fn test_late_tick_goes_straight_from_full_trail_to_disposal() {
    let mut scene = recording_scene();
    let mut rng = seeded_rng();
    let config = small_rocket_config();
    let mut rocket = vertical_rocket(&mut scene, &config, &mut rng);

    advance(&mut rocket, &mut scene, 0, &config, &mut rng);
    advance(&mut rocket, &mut scene, 2500, &config, &mut rng);

    assert_eq!(rocket.current_state(), RocketState::Exploding);
    assert_eq!(rocket.start_explosion_time(), Some(2500));
    assert!(!scene
        .commands()
        .iter()
        .any(|c| matches!(c, SceneCommand::SetEmitterRate(..) | SceneCommand::StopEmitter(_))));
}

// ==================================
// 4. Explosion
// ==================================

#[test]
fn test_explosion_start_releases_flight_resources() {
    let mut scene = recording_scene();
    let mut rng = seeded_rng();
    let config = small_rocket_config();
    let mut rocket = vertical_rocket(&mut scene, &config, &mut rng);

    for now in (0..2000).step_by(16) {
        advance(&mut rocket, &mut scene, now, &config, &mut rng);
    }
    let body = rocket.body().unwrap();
    let apex = scene.body_position(body);
    assert_eq!(rocket.current_state(), RocketState::Fired);

    advance(&mut rocket, &mut scene, 2000, &config, &mut rng);

    assert_eq!(rocket.current_state(), RocketState::Exploding);
    assert_eq!(rocket.start_explosion_time(), Some(2000));

    let stats = scene.stats();
    assert_eq!(stats.physics_bodies, 0);
    assert_eq!(stats.emitters, 0);
    assert_eq!(stats.clouds, 1);
    assert_eq!(scene.is_body_visible(body), Some(false));
    assert_eq!(scene.light_intensity(rocket.light().unwrap()), Some(1.0));

    // 10 m/s vers le haut pendant 2 s sous -3 m/s² : ~14 m
    let cloud = rocket.explosion().unwrap();
    assert!(apex.y > 12.0, "apex {:?}", apex);
    assert!((scene.body_position(body) - cloud.center()).length() < 0.2);
    assert_eq!(cloud.len(), config.particles_per_explosion);

    let pops: Vec<_> = scene
        .commands()
        .iter()
        .filter_map(|c| match c {
            SceneCommand::PlaySound(r) if r.cue != SoundCue::Whistle => Some(r.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(pops.len(), 2);
    assert_eq!(pops[0].cue, SoundCue::Pop);
    assert_eq!(pops[0].attached_to, Some(body));
    assert_eq!(pops[1].cue, SoundCue::Crackle);
    assert!(!pops[1].is_spatial());
}

#[test]
fn test_explosion_points_follow_velocity_scale() {
    let mut scene = recording_scene();
    let mut rng = seeded_rng();
    let config = RocketConfig {
        crackle_flicker: false,
        ..small_rocket_config()
    };
    let mut rocket = vertical_rocket(&mut scene, &config, &mut rng);

    advance(&mut rocket, &mut scene, 0, &config, &mut rng);
    advance(&mut rocket, &mut scene, 2000, &config, &mut rng);
    advance(&mut rocket, &mut scene, 3200, &config, &mut rng);

    let cloud = rocket.explosion().unwrap();
    let scale = velocity_scale(1200, config.explosion_velocity_gain);
    for (particle, point) in cloud.particles().iter().zip(cloud.points()) {
        assert_eq!(point.position, particle.position_at(scale).to_array());
        assert!((particle.initial_position - particle.radial_velocity - cloud.center()).length() < 1e-4);
    }
    assert!(scene.stats().uploaded_bytes > 0);
}

#[test]
fn test_light_fades_linearly_over_period() {
    let mut scene = recording_scene();
    let mut rng = seeded_rng();
    let config = small_rocket_config();
    let mut rocket = vertical_rocket(&mut scene, &config, &mut rng);
    advance(&mut rocket, &mut scene, 0, &config, &mut rng);
    advance(&mut rocket, &mut scene, 2000, &config, &mut rng);
    let light = rocket.light().unwrap();

    advance(&mut rocket, &mut scene, 3500, &config, &mut rng);
    assert!((scene.light_intensity(light).unwrap() - 0.5).abs() < 1e-6);

    advance(&mut rocket, &mut scene, 4250, &config, &mut rng);
    assert!((scene.light_intensity(light).unwrap() - 0.25).abs() < 1e-6);

    advance(&mut rocket, &mut scene, 5000, &config, &mut rng);
    assert_eq!(scene.light_intensity(light), Some(0.0));
}

#[test]
fn test_explosion_ends_strictly_after_period() {
    let mut scene = recording_scene();
    let mut rng = seeded_rng();
    let config = small_rocket_config();
    let mut rocket = vertical_rocket(&mut scene, &config, &mut rng);

    advance(&mut rocket, &mut scene, 0, &config, &mut rng);
    advance(&mut rocket, &mut scene, 2000, &config, &mut rng);
    advance(&mut rocket, &mut scene, 5000, &config, &mut rng);
    assert_eq!(rocket.current_state(), RocketState::Exploding);

    let outcome = rocket.update(5001, &mut scene, &config, &mut rng);
    assert!(outcome.cleaned_up);
    assert_eq!(rocket.current_state(), RocketState::CleanedUp);
    assert!(!rocket.holds_resources());
    assert!(scene.stats().is_empty(), "leaked: {:?}", scene.stats());
}

// ==================================
// 5. Ordre des transitions
// ==================================

#[test]
fn test_states_advance_in_order_and_entry_actions_follow() {
    let mut scene = recording_scene();
    let mut rng = seeded_rng();
    let config = small_rocket_config();
    let mut rocket = vertical_rocket(&mut scene, &config, &mut rng);

    let mut previous = rocket.current_state();
    for now in (0..6000).step_by(7) {
        advance(&mut rocket, &mut scene, now, &config, &mut rng);
        let state = rocket.current_state();
        assert!(state >= previous, "{} -> {}", previous, state);
        previous = state;
    }
    assert_eq!(previous, RocketState::CleanedUp);

    // Jalons de chaque état, dans l'ordre où la scène les reçoit
    let position = |pred: &dyn Fn(&SceneCommand) -> bool| {
        scene
            .commands()
            .iter()
            .position(pred)
            .expect("missing command")
    };
    let milestones = [
        position(&|c| matches!(c, SceneCommand::SetLinearVelocity(..))),
        position(&|c| matches!(c, SceneCommand::StopEmitter(_))),
        position(&|c| matches!(c, SceneCommand::DisposeEmitter(_))),
        position(&|c| matches!(c, SceneCommand::ReleasePhysics(_))),
        position(&|c| matches!(c, SceneCommand::BuildPointCloud(..))),
        position(&|c| matches!(c, SceneCommand::UpdatePointCloud(..))),
        position(&|c| matches!(c, SceneCommand::DisposePointCloud(_))),
        position(&|c| matches!(c, SceneCommand::DisposeLight(_))),
        position(&|c| matches!(c, SceneCommand::DisposeBody(_))),
    ];
    assert!(
        milestones.windows(2).all(|w| w[0] < w[1]),
        "milestones out of order: {:?}",
        milestones
    );
}

#[test]
fn test_cleaned_up_rocket_never_changes_again() {
    let mut scene = recording_scene();
    let mut rng = seeded_rng();
    let config = small_rocket_config();
    let mut rocket = vertical_rocket(&mut scene, &config, &mut rng);

    for now in [0, 2000, 5001] {
        advance(&mut rocket, &mut scene, now, &config, &mut rng);
    }
    assert_eq!(rocket.current_state(), RocketState::CleanedUp);
    let commands_before = scene.commands().len();

    for now in [6000, 60_000] {
        let outcome = rocket.update(now, &mut scene, &config, &mut rng);
        assert_eq!(outcome, RocketUpdate::default());
        assert_eq!(rocket.current_state(), RocketState::CleanedUp);
    }
    assert_eq!(scene.commands().len(), commands_before);
    assert_eq!(rocket.start_flight_time(), Some(0));
    assert_eq!(rocket.start_explosion_time(), Some(2000));
}

// ==================================
// 6. Inclinaison du modèle d'explosion
// ==================================

/// Explose une fusée verticale et retourne son nuage (points initiaux + centre).
fn explode(config: &RocketConfig, seed: u64) -> (Vec<Vec3>, Vec3) {
    let mut scene = fireworks_show::HeadlessScene::with_seed(helpers::GRAVITY, seed);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut rocket = vertical_rocket(&mut scene, config, &mut rng);
    advance(&mut rocket, &mut scene, 0, config, &mut rng);
    advance(&mut rocket, &mut scene, 2000, config, &mut rng);

    let cloud = rocket.explosion().unwrap();
    let points = cloud.particles().iter().map(|p| p.initial_position).collect();
    (points, cloud.center())
}

/// Normale du plan du cœur (le centre de l'explosion est dans ce plan).
fn plane_normal(points: &[Vec3], center: Vec3) -> Vec3 {
    points
        .iter()
        .flat_map(|a| points.iter().map(move |b| (*a - center).cross(*b - center)))
        .max_by(|u, v| u.length_squared().total_cmp(&v.length_squared()))
        .unwrap()
        .normalize()
}

#[test]
fn test_zero_tilt_keeps_template_orientation() {
    let config = RocketConfig {
        template_tilt_x: 0.0,
        template_tilt_y: 0.0,
        template_tilt_z: 0.0,
        ..small_rocket_config()
    };

    let (points, center) = explode(&config, 11);

    // Le cœur reste dans le plan XY, simplement translaté au centre
    for p in &points {
        assert_eq!(p.z, center.z);
        assert!((*p - center).length() <= 1.6, "{:?}", p);
    }
}

#[test]
fn test_tilt_is_bounded_and_drawn_per_rocket() {
    let config = small_rocket_config();
    let max_angle = config.template_tilt_x + config.template_tilt_y + config.template_tilt_z;

    let normals: Vec<Vec3> = (1..=5)
        .map(|seed| {
            let (points, center) = explode(&config, seed);
            // Une rotation conserve les distances au centre
            for p in &points {
                assert!((*p - center).length() <= 1.6, "{:?}", p);
            }
            let normal = plane_normal(&points, center);
            assert!(
                normal.z.abs() >= max_angle.cos() - 1e-3,
                "tilt beyond bounds: {:?}",
                normal
            );
            normal
        })
        .collect();

    // Tirage propre à chaque fusée
    assert!(normals
        .windows(2)
        .any(|w| w[0].dot(w[1]).abs() < 1.0 - 1e-4));
}

#[test]
fn test_tilt_never_modifies_shared_template() {
    let mut scene = recording_scene();
    let mut rng = seeded_rng();
    let config = small_rocket_config();
    let template = heart();
    let casters: Rc<[MeshHandle]> = Rc::from(Vec::new());

    for _ in 0..3 {
        let mut rocket = fireworks_show::Rocket::new(
            &mut scene,
            &config,
            &mut rng,
            Vec3::Y,
            Vec3::ZERO,
            Rc::clone(&casters),
            Rc::clone(&template),
        );
        advance(&mut rocket, &mut scene, 0, &config, &mut rng);
        advance(&mut rocket, &mut scene, 2000, &config, &mut rng);
        advance(&mut rocket, &mut scene, 5001, &config, &mut rng);
    }

    let samples = template.sample_surface(200, glam::Affine3A::IDENTITY, &mut rng);
    assert!(samples.iter().all(|p| p.z == 0.0));
}
