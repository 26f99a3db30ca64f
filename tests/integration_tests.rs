//! Integration tests for the roadcast dataset pipeline.

use ndarray::{s, Axis};
use roadcast::scaler::unscale_channels;
use roadcast::{
    CacheFormat, CacheKey, Config, DatasetConfig, EdgeSampler, Line, RoadcastError,
    TrafficSpeedDataset,
};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const SENSORS: [&str; 3] = ["716", "717", "718"];
const STEPS: usize = 40;

/// Speed of a sensor at a time step; unique per cell so windows are traceable.
fn speed(sensor: usize, step: usize) -> f64 {
    50.0 + sensor as f64 * 10.0 + step as f64 * 0.25
}

/// Writes a small three-sensor dataset sampled every 15 minutes.
fn create_test_dataset(dir: &Path) {
    fs::write(
        dir.join("SYN.geo"),
        "geo_id,type,coordinates\n716,Point,\"[-118.3, 34.1]\"\n717,Point,\"[-118.2, 34.1]\"\n718,Point,\"[-118.1, 34.2]\"\n",
    )
    .unwrap();

    // The last row references a sensor that is not in the entity table.
    fs::write(
        dir.join("SYN.rel"),
        "rel_id,type,origin_id,destination_id,cost\n\
         0,geo,716,716,0.0\n\
         1,geo,716,717,1200.0\n\
         2,geo,717,718,800.0\n\
         3,geo,718,716,2500.0\n\
         4,geo,718,999,100.0\n",
    )
    .unwrap();

    let mut dyna = String::from("dyna_id,type,time,entity_id,traffic_speed\n");
    let mut row = 0;
    for (s, sensor) in SENSORS.iter().enumerate() {
        for t in 0..STEPS {
            let minutes = t * 15;
            dyna.push_str(&format!(
                "{},state,2012-03-01T{:02}:{:02}:00Z,{},{}\n",
                row,
                minutes / 60,
                minutes % 60,
                sensor,
                speed(s, t)
            ));
            row += 1;
        }
    }
    fs::write(dir.join("SYN.dyna"), dyna).unwrap();
}

fn create_config(dir: &Path) -> DatasetConfig {
    DatasetConfig {
        dataset: "SYN".to_string(),
        data_dir: dir.to_path_buf(),
        cache_dir: dir.join("cache"),
        input_window: 4,
        output_window: 3,
        batch_size: 8,
        seed: Some(42),
        ..Default::default()
    }
}

#[test]
fn test_full_pipeline_shapes() {
    let dir = tempdir().unwrap();
    create_test_dataset(dir.path());

    let mut config = create_config(dir.path());
    config.add_time_in_day = true;
    config.add_day_in_week = true;
    let dataset = TrafficSpeedDataset::new(config).unwrap();
    let mut prepared = dataset.get_data().unwrap();

    // 40 - 4 - 3 + 1 = 34 samples -> train 24, test 7, val 3.
    assert_eq!(prepared.train.num_samples(), 24);
    assert_eq!(prepared.eval.num_samples(), 3);
    assert_eq!(prepared.test.num_samples(), 7);
    assert_eq!(prepared.train.inputs().shape(), &[24, 4, 3, 9]);
    assert_eq!(prepared.train.targets().shape(), &[24, 3, 3, 9]);

    let feature = &prepared.feature;
    assert_eq!(feature.num_nodes, 3);
    assert_eq!(feature.feature_dim, 9);
    assert_eq!(feature.output_dim, 1);

    // Thursday, so the one-hot block has a single 1 in position 3.
    let batch = prepared.eval.iter().next().unwrap();
    let dow = batch.x.slice(s![0, 0, 0, 2..]).to_vec();
    assert_eq!(dow, vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]);
}

#[test]
fn test_windows_follow_the_series() {
    let dir = tempdir().unwrap();
    create_test_dataset(dir.path());

    let mut config = create_config(dir.path());
    config.shuffle = false;
    let dataset = TrafficSpeedDataset::new(config).unwrap();
    let mut prepared = dataset.get_data().unwrap();

    let first = prepared.train.iter().next().unwrap();
    for sensor in 0..SENSORS.len() {
        let inputs: Vec<f64> = first.x.slice(s![0, .., sensor, 0]).to_vec();
        let targets: Vec<f64> = first.y.slice(s![0, .., sensor, 0]).to_vec();
        assert_eq!(inputs, (0..4).map(|t| speed(sensor, t)).collect::<Vec<_>>());
        assert_eq!(targets, (4..7).map(|t| speed(sensor, t)).collect::<Vec<_>>());
    }

    // The test partition ends with the last window of the series.
    let test_y = prepared.test.targets();
    let last = test_y.index_axis(Axis(0), test_y.len_of(Axis(0)) - 1);
    assert_eq!(last[[2, 0, 0]], speed(0, STEPS - 1));
}

#[test]
fn test_padding_fills_every_batch() {
    let dir = tempdir().unwrap();
    create_test_dataset(dir.path());

    let mut config = create_config(dir.path());
    config.batch_size = 5;
    let dataset = TrafficSpeedDataset::new(config.clone()).unwrap();
    let mut prepared = dataset.get_data().unwrap();

    // 7 test samples pad to 10.
    let sizes: Vec<usize> = prepared.test.iter().map(|b| b.len()).collect();
    assert_eq!(sizes, vec![5, 5]);

    config.pad_with_last_sample = false;
    let dataset = TrafficSpeedDataset::new(config).unwrap();
    let mut prepared = dataset.get_data().unwrap();
    let sizes: Vec<usize> = prepared.test.iter().map(|b| b.len()).collect();
    assert_eq!(sizes, vec![5, 2]);
}

#[test]
fn test_cache_written_and_reloaded() {
    let dir = tempdir().unwrap();
    create_test_dataset(dir.path());
    let config = create_config(dir.path());

    let dataset = TrafficSpeedDataset::new(config.clone()).unwrap();
    let generated = dataset.get_data().unwrap();

    let path = CacheKey::from_config(&config)
        .cache_path(&config.cache_dir)
        .unwrap();
    assert!(path.exists());
    let header = CacheFormat::read_header(&path).unwrap();
    assert_eq!(header.num_arrays, 6);
    assert!(header.is_compressed());

    // Remove the raw series: a second run must be served from the cache.
    fs::remove_file(dir.path().join("SYN.dyna")).unwrap();
    let reloaded = TrafficSpeedDataset::new(config).unwrap().get_data().unwrap();
    assert_eq!(reloaded.test.inputs(), generated.test.inputs());
    assert_eq!(reloaded.eval.targets(), generated.eval.targets());
}

#[test]
fn test_scaled_data_inverts_to_raw() {
    let dir = tempdir().unwrap();
    create_test_dataset(dir.path());

    for scaler in ["normal", "standard", "minmax01", "minmax11"] {
        let mut config = create_config(dir.path());
        config.scaler = scaler.to_string();
        config.cache_dataset = false;
        let prepared = TrafficSpeedDataset::new(config).unwrap().get_data().unwrap();

        let mut restored = (**prepared.test.inputs()).clone();
        unscale_channels(prepared.feature.scaler.as_ref(), &mut restored, 1);
        assert!((restored[[0, 0, 1, 0]] - speed(1, 27)).abs() < 1e-9, "{}", scaler);
    }
}

#[test]
fn test_adjacency_skips_unknown_entities() {
    let dir = tempdir().unwrap();
    create_test_dataset(dir.path());

    let dataset = TrafficSpeedDataset::new(create_config(dir.path())).unwrap();
    let adj = dataset.adjacency().unwrap();
    assert_eq!(adj.num_nodes(), 3);
    assert_eq!(adj.get(0, 1), Some(1200.0));
    assert_eq!(adj.get(2, 0), Some(2500.0));
    assert_eq!(adj.get(1, 0), Some(f64::INFINITY));
    // The zero-distance self loop is not an edge.
    assert_eq!(adj.num_edges(), 3);
}

#[test]
fn test_missing_entity_table() {
    let dir = tempdir().unwrap();
    create_test_dataset(dir.path());
    fs::remove_file(dir.path().join("SYN.geo")).unwrap();

    let err = TrafficSpeedDataset::new(create_config(dir.path()))
        .err()
        .unwrap();
    assert!(matches!(err, RoadcastError::MissingInput(_)));
}

#[test]
fn test_line_loss_on_sampled_edges() {
    let dir = tempdir().unwrap();
    create_test_dataset(dir.path());

    let json = r#"{"embedding": {"order": "second", "embedding_size": 16, "negative_ratio": 1, "seed": 7}}"#;
    let config_path = dir.path().join("config.json");
    fs::write(&config_path, json).unwrap();
    let config = Config::from_file(&config_path).unwrap();

    let mut dataset_config = create_config(dir.path());
    dataset_config.calculate_weight = true;
    let dataset = TrafficSpeedDataset::new(dataset_config).unwrap();
    let adj = dataset.adjacency().unwrap();

    let samples = EdgeSampler::new(config.embedding.negative_ratio, config.embedding.seed)
        .sample(adj)
        .unwrap();
    assert!(samples.iter().any(|s| s.label > 0.0));

    let model = Line::new(&config.embedding, dataset.num_nodes()).unwrap();
    let loss = model.calculate_loss(&samples).unwrap();
    assert!(loss.is_finite());
    assert!(loss > 0.0);
}
