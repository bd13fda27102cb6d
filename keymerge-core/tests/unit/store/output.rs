use super::*;

fn fresh_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("store_tests").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[test]
fn base36_matches_known_values() {
    assert_eq!(to_base36(0), "0");
    assert_eq!(to_base36(35), "z");
    assert_eq!(to_base36(36), "10");
    assert_eq!(to_base36(i64::MAX as u64), "1y2p0ij32e8e7");
}

#[test]
fn random_ids_are_non_negative_63_bit() {
    let mut ids = RandomIds::seeded(7);
    for _ in 0..64 {
        let id = ids.next_id();
        let v = u64::from_str_radix(&id, 36).unwrap();
        assert!(v <= i64::MAX as u64);
    }
}

#[test]
fn seeded_random_ids_are_reproducible() {
    let mut g = RandomIds::seeded(42);
    let a: Vec<_> = (0..4).map(|_| g.next_id()).collect();
    let mut g = RandomIds::seeded(42);
    let b: Vec<_> = (0..4).map(|_| g.next_id()).collect();
    assert_eq!(a, b);
}

#[test]
fn save_then_open() {
    let dir = fresh_dir("save_then_open");
    let mut store = OutputStore::new(&dir, SequentialIds::default());
    let img = DynamicImage::new_rgba8(2, 3);

    let saved = store.save(&img).unwrap();
    assert_eq!(saved.id, "0");
    assert_eq!(saved.path, dir.join("0.png"));

    let bytes = store.open(&saved.id).unwrap();
    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (2, 3));
}

#[test]
fn save_skips_taken_ids() {
    let dir = fresh_dir("skips_taken");
    let img = DynamicImage::new_rgba8(1, 1);

    let mut first = OutputStore::new(&dir, SequentialIds::default());
    first.save(&img).unwrap();

    let mut second = OutputStore::new(&dir, SequentialIds::default());
    let saved = second.save(&img).unwrap();
    assert_eq!(saved.id, "1");
}

#[test]
fn save_never_replaces_a_file_already_on_disk() {
    let dir = fresh_dir("keeps_existing");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("0.png"), b"keep").unwrap();

    let mut store = OutputStore::new(&dir, SequentialIds::default());
    let saved = store.save(&DynamicImage::new_rgba8(1, 1)).unwrap();
    assert_eq!(saved.id, "1");
    assert_eq!(std::fs::read(dir.join("0.png")).unwrap(), b"keep");
}

#[test]
fn save_gives_up_when_ids_repeat() {
    struct Fixed;
    impl IdGenerator for Fixed {
        fn next_id(&mut self) -> String {
            "same".to_owned()
        }
    }

    let dir = fresh_dir("gives_up");
    let img = DynamicImage::new_rgba8(1, 1);
    let mut store = OutputStore::new(&dir, Fixed);
    store.save(&img).unwrap();
    assert!(store.save(&img).is_err());
}

#[test]
fn ids_outside_base36_alphabet_are_rejected() {
    let store = OutputStore::new("tmp", SequentialIds::default());
    for bad in ["", "../etc", "A1", "a.b", "a/b"] {
        assert!(matches!(
            store.path_for(bad),
            Err(KeymergeError::InvalidId(_))
        ));
    }
    assert_eq!(
        store.path_for("z9").unwrap(),
        PathBuf::from("tmp").join("z9.png")
    );
}

#[test]
fn open_missing_is_not_found() {
    let store = OutputStore::new(fresh_dir("missing"), SequentialIds::starting_at(5));
    assert!(matches!(store.open("abc"), Err(KeymergeError::NotFound(_))));
}
