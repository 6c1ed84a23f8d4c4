use pdfsort::fs_apply::{copy_all, copy_unique};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

#[test]
fn same_name_copies_get_numbered() {
    let temp = tempdir().unwrap();
    let first = temp.path().join("a");
    let second = temp.path().join("b");
    let dest = temp.path().join("out");
    fs::create_dir_all(&first).unwrap();
    fs::create_dir_all(&second).unwrap();
    fs::write(first.join("spec.pdf"), b"first").unwrap();
    fs::write(second.join("spec.pdf"), b"second").unwrap();

    let a = copy_unique(&first.join("spec.pdf"), &dest).unwrap();
    let b = copy_unique(&second.join("spec.pdf"), &dest).unwrap();
    let c = copy_unique(&first.join("spec.pdf"), &dest).unwrap();

    assert_eq!(a, dest.join("spec.pdf"));
    assert_eq!(b, dest.join("spec_1.pdf"));
    assert_eq!(c, dest.join("spec_2.pdf"));
    assert_eq!(fs::read(&a).unwrap(), b"first");
    assert_eq!(fs::read(&b).unwrap(), b"second");
}

#[test]
fn copy_all_reports_failures_and_continues() {
    let temp = tempdir().unwrap();
    let src = temp.path().join("in.pdf");
    fs::write(&src, b"%PDF").unwrap();
    let missing = temp.path().join("missing.pdf");
    let dest = temp.path().join("out");

    let report = copy_all([missing.as_path(), src.as_path()], &dest);
    assert_eq!(report.copied, vec![dest.join("in.pdf")]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, missing);
    assert!(Path::new(&dest.join("in.pdf")).is_file());
}
