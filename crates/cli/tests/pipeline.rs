use pdfsort::fs_apply;
use pdfsort_core::config::AppConfig;
use pdfsort_core::extractor::MemoryTextSource;
use pdfsort_core::models::DecisionStage;
use pdfsort_core::pipeline::{self, Pipeline, FEATURES_ARTIFACT};
use pdfsort_core::report::{self, CategorizeSummary, PredictionStats, STANDARD_FILES};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::tempdir;

const STANDARD_TEXT: &str = "本标准规定了电动汽车充电设备的技术要求。\n";
const DATASHEET_TEXT: &str = "This datasheet describes the chip module. 产品 芯片 模块 设备 系统\n";

/// Writes a placeholder file and registers its text with the source.
fn add(source: MemoryTextSource, dir: &Path, name: &str, text: &str, lines: usize) -> MemoryTextSource {
    let path = dir.join(name);
    fs::write(&path, b"%PDF-1.4").unwrap();
    source.with_text(path, &text.repeat(lines))
}

fn config(model_dir: &Path) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.model.dir = model_dir.to_string_lossy().into_owned();
    cfg.model.n_trees = 30;
    cfg.model.max_depth = 8;
    cfg
}

#[tokio::test]
async fn test_extract_train_predict_copy() {
    let temp = tempdir().unwrap();
    let standards = temp.path().join("standards");
    let inbox = temp.path().join("inbox");
    let model_dir = temp.path().join("model");
    let out_dir = temp.path().join("out");
    fs::create_dir_all(&standards).unwrap();
    fs::create_dir_all(&inbox).unwrap();

    let mut source = MemoryTextSource::new();
    for i in 0..12 {
        let name = if i % 2 == 0 {
            format!("GB {}-20{} 电动汽车充电技术规范.pdf", 18000 + i, 10 + i)
        } else {
            format!("DB11 {}-20{} 电动汽车充电设施规范.pdf", 1400 + i, 10 + i)
        };
        source = add(source, &standards, &name, STANDARD_TEXT, 10);
        source = add(source, &standards, &format!("MCU{}_datasheet.pdf", i), DATASHEET_TEXT, 5);
    }
    let standard_name = "GB 20234.1-2023 电动汽车充电技术规范.pdf";
    source = add(source, &inbox, standard_name, STANDARD_TEXT, 10);
    source = add(source, &inbox, "ESP32C3_datasheet.pdf", DATASHEET_TEXT, 5);
    // Present on disk, unreadable through the source.
    fs::write(inbox.join("broken.pdf"), b"").unwrap();

    let pipeline = Pipeline::new(config(&model_dir), Arc::new(source)).unwrap();

    // 1. Extract and dump features
    let (records, summary) = pipeline
        .extract_features(&[standards.clone()])
        .await
        .unwrap();
    assert_eq!(summary.total, 24);
    assert_eq!(summary.failed, 0);
    assert_eq!(records.iter().filter(|r| r.is_standard).count(), 12);
    let dump = model_dir.join(FEATURES_ARTIFACT);
    pipeline::save_features(&dump, &records).unwrap();

    // 2. Train from the dump
    let loaded = pipeline::load_features(&dump).unwrap();
    let model = pipeline.train(&loaded).unwrap();
    assert_eq!(model.info.n_samples, 24);
    assert!(model_dir.join("model_info.json").is_file());

    // 3. Predict with the persisted artifacts
    let predictor = pipeline.load_predictor().unwrap();
    let (results, summary) = pipeline.predict(&predictor, &[inbox.clone()]).await.unwrap();
    assert_eq!(summary.total, 3);
    assert_eq!(summary.failed, 1);

    let accepted: Vec<&str> = results
        .iter()
        .filter(|r| r.is_standard)
        .map(|r| r.filename.as_str())
        .collect();
    assert_eq!(accepted, vec![standard_name]);
    let broken = results.iter().find(|r| r.filename == "broken.pdf").unwrap();
    assert_eq!((broken.prediction, broken.probability), (0, 0.0));

    let report_dir = temp.path().join("reports");
    let stats = report::write_prediction_reports(&report_dir, &results).unwrap();
    assert_eq!(stats.total_files, 3);
    assert_eq!(stats.standard_files, 1);
    assert!(report_dir.join(STANDARD_FILES).is_file());
    let written: PredictionStats = serde_json::from_slice(
        &fs::read(report_dir.join(report::PREDICTION_STATS)).unwrap(),
    )
    .unwrap();
    assert_eq!(written.total_files, 3);

    // 4. Copy accepted files
    let copy = fs_apply::copy_all(
        results
            .iter()
            .filter(|r| r.is_standard)
            .map(|r| Path::new(r.file_path.as_str())),
        &out_dir,
    );
    assert!(copy.failed.is_empty());
    assert_eq!(copy.copied, vec![out_dir.join(standard_name)]);
}

#[tokio::test]
async fn test_categorize_tree() {
    let temp = tempdir().unwrap();
    let inbox = temp.path().join("inbox");
    fs::create_dir_all(&inbox).unwrap();

    let mut source = MemoryTextSource::new();
    source = add(source, &inbox, "ESP32_Datasheet.pdf", "", 1);
    source = add(source, &inbox, "random-notes.pdf", "", 1);
    fs::write(inbox.join("逆变器MODBUS点表.pdf"), b"").unwrap();

    let pipeline = Pipeline::new(AppConfig::default(), Arc::new(source)).unwrap();
    let files = pipeline.categorize(&[inbox.clone()]).await.unwrap();
    assert_eq!(files.len(), 3);

    let by_name = |name: &str| files.iter().find(|f| f.filename == name).unwrap();

    let datasheet = by_name("ESP32_Datasheet.pdf").decision.clone().unwrap();
    assert_eq!(datasheet.category, "芯片数据手册");
    assert_eq!(datasheet.stage, DecisionStage::ExactMatch);

    let protocol = by_name("逆变器MODBUS点表.pdf");
    assert!(protocol.error.is_some());
    let decision = protocol.decision.clone().unwrap();
    assert_eq!(decision.category, "设备通讯协议");
    assert_eq!(decision.stage, DecisionStage::FilenameKeyword);

    assert!(by_name("random-notes.pdf").decision.is_none());

    let summary = CategorizeSummary::from_files(&files);
    assert_eq!(summary.total, 3);
    assert_eq!(summary.unclassified, 1);
    assert_eq!(summary.extraction_failures, 1);

    let paths: Vec<PathBuf> = files.iter().map(|f| f.file_path.clone()).collect();
    let mut sorted = paths.clone();
    sorted.sort();
    assert_eq!(paths, sorted);
}
