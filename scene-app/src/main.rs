use anyhow::Context;
use glam::Vec2;
use rein_scene2d::{
    BodyDef, BodyType, FixtureDef, ObjectId, Scene, SceneConfig, SceneEvent, SceneObject,
};

/// Simulated frame time of a ~144 Hz display.
const FRAME_TIME: f64 = 1.0 / 144.0;

struct Demo {
    scene: Scene,
    walker: ObjectId,
    spinner: ObjectId,
    crate_id: ObjectId,
}

impl Demo {
    fn new() -> anyhow::Result<Self> {
        let mut scene = Scene::new(SceneConfig {
            gravity: Vec2::new(0.0, -9.8),
            ..Default::default()
        });

        let mut ground = SceneObject::with_body(BodyDef {
            body_type: BodyType::Static,
            position: Vec2::new(0.0, -5.0),
            ..Default::default()
        });
        ground.set_size(Vec2::new(40.0, 1.0));
        ground
            .shapes_mut()
            .try_create_polygon_box(40.0, 1.0, Vec2::ZERO, 0.0)
            .context("ground shape")?;
        scene.add_object(ground);

        let mut walker = SceneObject::with_body(BodyDef {
            body_type: BodyType::Kinematic,
            position: Vec2::new(-8.0, 0.0),
            ..Default::default()
        });
        walker
            .shapes_mut()
            .try_create_circle(0.5, Vec2::ZERO)
            .context("walker shape")?;
        walker.set_collision_callback(true);
        let walker = scene.add_object(walker);

        let mut spinner = SceneObject::with_body(BodyDef {
            body_type: BodyType::Kinematic,
            position: Vec2::new(4.0, 2.0),
            ..Default::default()
        });
        spinner.set_size(Vec2::new(3.0, 0.5));
        spinner
            .shapes_mut()
            .try_create_polygon_box(3.0, 0.5, Vec2::ZERO, 0.0)
            .context("spinner shape")?;
        let spinner = scene.add_object(spinner);

        // A falling crate whose shapes are loaded from stored records.
        let records: Vec<FixtureDef> = serde_json::from_str(CRATE_SHAPES).context("crate shape records")?;
        let mut falling = SceneObject::with_body(BodyDef {
            position: Vec2::new(0.0, 6.0),
            ..Default::default()
        });
        falling.load_collision_shape_records(records);
        falling.set_sleeping_callback(true);
        falling.set_lifetime(3.0);
        let crate_id = scene.add_object(falling);

        Ok(Self {
            scene,
            walker,
            spinner,
            crate_id,
        })
    }

    fn start_commands(&mut self) -> anyhow::Result<()> {
        self.scene
            .object_mut(self.walker)
            .context("walker missing")?
            .try_move_to(Vec2::new(8.0, 0.0), 4.0, true, true)?;
        self.scene
            .object_mut(self.spinner)
            .context("spinner missing")?
            .try_rotate_to(std::f32::consts::PI * 0.75, 1.5, true, true)?;
        Ok(())
    }

    fn run(&mut self, seconds: f64) {
        let frames = (seconds / FRAME_TIME) as usize;
        for frame in 0..frames {
            let ticks = self.scene.update(FRAME_TIME);
            for event in self.scene.drain_events() {
                self.report(frame, event);
            }
            if ticks > 0 && frame % 144 == 0 {
                if let Some(walker) = self.scene.object(self.walker) {
                    log::info!(
                        "t={:.2}s walker at {} (render {})",
                        self.scene.scene_time(),
                        walker.position(),
                        walker.render_position()
                    );
                }
            }
        }
    }

    fn report(&self, frame: usize, event: SceneEvent) {
        match event {
            SceneEvent::SceneUpdated { .. } | SceneEvent::Updated(_) => {}
            SceneEvent::MoveToComplete(id) if id == self.walker => {
                log::info!("frame {}: walker arrived", frame);
            }
            SceneEvent::RotateToComplete(id) if id == self.spinner => {
                log::info!("frame {}: spinner finished rotating", frame);
            }
            SceneEvent::LifetimeExpired(id) if id == self.crate_id => {
                log::info!("frame {}: crate expired", frame);
            }
            SceneEvent::CollisionBegan(contact) => {
                log::info!(
                    "frame {}: {:?} shape {} touched {:?} shape {}",
                    frame,
                    contact.object,
                    contact.shape,
                    contact.other,
                    contact.other_shape
                );
            }
            other => log::debug!("frame {}: {:?}", frame, other),
        }
    }
}

const CRATE_SHAPES: &str = r#"[
    {
        "shape": { "kind": "polygon", "vertices": [[-0.5, -0.5], [0.5, -0.5], [0.5, 0.5], [-0.5, 0.5]] },
        "material": { "density": 2.0, "friction": 0.6, "restitution": 0.1, "is_sensor": false }
    },
    {
        "shape": { "kind": "circle", "radius": 0.25, "center": [0.0, 0.75] },
        "material": { "density": 0.5, "friction": 0.2, "restitution": 0.0, "is_sensor": true }
    }
]"#;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let mut demo = Demo::new()?;
    demo.start_commands()?;
    demo.run(6.0);
    log::info!(
        "done: {} objects, {} bodies left",
        demo.scene.object_count(),
        demo.scene.physics().body_count()
    );
    Ok(())
}
