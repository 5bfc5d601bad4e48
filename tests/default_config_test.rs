//! Train then serve with every setting left at its default
//!
//! Relative default paths resolve against the working directory, so this
//! file holds a single test that moves into a scratch directory.

use maintenance_ml::config::{ServeConfig, TrainConfig};
use maintenance_ml::dataset::Dataset;
use maintenance_ml::experiment::{FileTracker, ModelUri};
use maintenance_ml::model::Regressor;
use maintenance_ml::pipeline::TrainingPipeline;
use maintenance_ml::serving::PredictionService;
use maintenance_ml::training::{Hyperparameters, Trainer};
use std::fmt::Write as _;

fn write_default_dataset(rows: usize) {
    let mut text = String::from("feature_1,feature_2,feature_3,feature_4,feature_5,RUL\n");
    for i in 0..rows {
        let cycle = i as f64;
        writeln!(
            text,
            "{},{},{},{},{},{}",
            cycle,
            (i % 9) as f64,
            100.0 + (i % 13) as f64,
            (i * 7 % 11) as f64,
            0.5 * cycle,
            250.0 - 2.0 * cycle
        )
        .unwrap();
    }
    std::fs::create_dir_all("data").unwrap();
    std::fs::write("data/maintenance_data.csv", text).unwrap();
}

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn test_default_train_output_is_served_by_default() {
    let dir = tempfile::tempdir().unwrap();
    std::env::set_current_dir(dir.path()).unwrap();
    write_default_dataset(100);

    let trainer = Trainer::new(Hyperparameters {
        n_estimators: 10,
        ..Hyperparameters::default()
    });

    // train
    let train_config = TrainConfig::from_lookup(no_env);
    let dataset = Dataset::load(&train_config.data_path).unwrap();
    let mut tracker =
        FileTracker::open(&train_config.tracking_dir, &train_config.experiment_name).unwrap();
    let outcome = trainer.train(&dataset, &mut tracker).unwrap();
    let exported = train_config.export_model(&outcome.artifact).unwrap().unwrap();
    assert!(exported.ends_with("models/latest_model/model.json"));

    let serve_config = ServeConfig::from_lookup(no_env).unwrap();
    assert!(matches!(serve_config.model_uri, ModelUri::Path(_)));
    let state = PredictionService::load(&serve_config).unwrap();
    let served = state.model.artifact();
    assert_eq!(served.n_features(), 5);
    let row = [1.0, 2.0, 3.0, 4.0, 5.0];
    let served_rul = served.predict_row(&row).unwrap();
    let trained_rul = outcome.artifact.predict_row(&row).unwrap();
    assert!((served_rul - trained_rul).abs() < 1e-9);

    // pipeline refreshes the same location
    let piped = TrainingPipeline::new(trainer)
        .run(&train_config.data_path, &mut tracker)
        .unwrap();
    train_config.export_model(&piped.training.artifact).unwrap();
    let reloaded = PredictionService::load(&serve_config).unwrap();
    assert_eq!(reloaded.model.artifact().model().trees().len(), 10);
    assert_eq!(tracker.load_store().unwrap().run_count(), 2);
}
