//! Golden tests for identity hashing.
//!
//! These tests pin the canonical byte stream and digest of known values and
//! verify determinism, field exclusion, ordering and failure modes.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::rc::Rc;
use std::sync::{mpsc, Arc, Mutex};

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use destruct::{
    canonical_bytes, hash_identity, must_hash_identity, DigestAlgorithm, ErrorKind, Identity,
    IdentityConfig, IdentityError, IdentityHasher,
};
use serde_json::json;

/// SHA-512 of the canonical bytes of [`jarrod`].
const PERSON_SHA512: &str = "397a2ad76e74eeec7d10eab7c80c2842c45ca81e34e5a91879a850f83ce4ba1e47ef72ab3a9483b3c6b47dd8ee9754f078c13b51824393f08e453b8fb7d91331";

/// SHA-256 of the canonical bytes of [`jarrod`].
const PERSON_SHA256: &str = "31f539100e4a5f4edcc25ca0a11b82f095045bd51f2f5ec4daea49a5ab20a3d1";

/// SHA-512 of the empty byte stream.
const EMPTY_SHA512: &str = "cf83e1357eefb8bdf1542850d66d8007d620e4050b5715dc83f4a921d36ce9ce47d0d13c5d85f2b0ff8318d2877eec2f63b931bd47417a81a538327af927da3e";

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Clone, Identity)]
struct Person {
    first_name: String,
    last_name: String,
    email_address: String,
    birth_date: DateTime<FixedOffset>,
    #[identity = "-"]
    created_date: DateTime<Utc>,
}

fn est() -> FixedOffset {
    FixedOffset::west_opt(5 * 3600).unwrap()
}

fn jarrod() -> Person {
    Person {
        first_name: "Jarrod".to_string(),
        last_name: "Roberson".to_string(),
        email_address: "jarrod@vertigrated.com".to_string(),
        birth_date: est().with_ymd_and_hms(1967, 11, 27, 0, 0, 0).unwrap(),
        created_date: Utc.with_ymd_and_hms(2023, 6, 1, 12, 0, 0).unwrap(),
    }
}

#[derive(Identity)]
struct Counter {
    count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Identity)]
struct Address {
    street: String,
    zip: u32,
}

#[derive(Identity)]
struct Contact {
    address: Option<Address>,
}

#[derive(Identity)]
struct Link {
    label: String,
    next: Option<Rc<RefCell<Link>>>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Person Scenario
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_person_canonical_bytes() {
    init_tracing();

    let bytes = canonical_bytes(&jarrod()).unwrap();
    let expected = b"1967-11-27T00:00:00-05:00jarrod@vertigrated.comJarrodRoberson";
    assert_eq!(bytes, expected.to_vec());
}

#[test]
fn test_person_golden_digest() {
    init_tracing();

    assert_eq!(hash_identity(&jarrod()).unwrap(), PERSON_SHA512);
    assert_eq!(must_hash_identity(&jarrod()), PERSON_SHA512);

    let sha256 = IdentityHasher::new(IdentityConfig::new().with_algorithm(DigestAlgorithm::Sha256));
    assert_eq!(sha256.hash(&jarrod()).unwrap(), PERSON_SHA256);
}

#[test]
fn test_excluded_field_does_not_affect_hash() {
    init_tracing();

    let first = jarrod();
    let mut second = jarrod();
    second.created_date = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();

    assert_eq!(hash_identity(&first).unwrap(), hash_identity(&second).unwrap());
}

#[test]
fn test_included_field_changes_hash() {
    init_tracing();

    let mut renamed = jarrod();
    renamed.last_name = "Robertson".to_string();
    assert_ne!(hash_identity(&jarrod()).unwrap(), hash_identity(&renamed).unwrap());

    let mut reborn = jarrod();
    reborn.birth_date = est().with_ymd_and_hms(1967, 11, 28, 0, 0, 0).unwrap();
    assert_ne!(hash_identity(&jarrod()).unwrap(), hash_identity(&reborn).unwrap());
}

#[test]
fn test_offset_is_significant() {
    let mut utc = jarrod();
    utc.birth_date = utc.birth_date.with_timezone(&FixedOffset::east_opt(0).unwrap());

    // Same instant, different offset
    assert_eq!(utc.birth_date, jarrod().birth_date);
    assert_ne!(hash_identity(&utc).unwrap(), hash_identity(&jarrod()).unwrap());
}

// ─────────────────────────────────────────────────────────────────────────────
// Determinism
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_repeated_hashing_is_stable() {
    let person = jarrod();
    let first = hash_identity(&person).unwrap();
    for _ in 0..100 {
        assert_eq!(hash_identity(&person).unwrap(), first);
    }
}

#[test]
fn test_hash_map_insertion_order_ignored() {
    let mut forward = HashMap::new();
    let mut backward = HashMap::new();
    for i in 0..50u32 {
        forward.insert(format!("key-{i}"), i);
    }
    for i in (0..50u32).rev() {
        backward.insert(format!("key-{i}"), i);
    }

    assert_eq!(hash_identity(&forward).unwrap(), hash_identity(&backward).unwrap());

    let sorted: BTreeMap<_, _> = forward.clone().into_iter().collect();
    assert_eq!(hash_identity(&forward).unwrap(), hash_identity(&sorted).unwrap());
}

#[test]
fn test_sets_ignore_order_and_container() {
    let hashed: HashSet<&str> = ["pear", "apple", "fig"].into_iter().collect();
    let ordered: BTreeSet<&str> = ["fig", "pear", "apple"].into_iter().collect();

    assert_eq!(canonical_bytes(&hashed).unwrap(), b"applefigpear".to_vec());
    assert_eq!(hash_identity(&hashed).unwrap(), hash_identity(&ordered).unwrap());
}

#[test]
fn test_field_declaration_order_ignored() {
    #[derive(Identity)]
    struct Forward {
        alpha: u8,
        beta: u8,
    }

    #[derive(Identity)]
    struct Backward {
        beta: u8,
        alpha: u8,
    }

    let forward = Forward { alpha: 1, beta: 2 };
    let backward = Backward { beta: 2, alpha: 1 };
    assert_eq!(canonical_bytes(&forward).unwrap(), vec![1, 2]);
    assert_eq!(hash_identity(&forward).unwrap(), hash_identity(&backward).unwrap());
}

#[test]
fn test_sequence_order_matters() {
    assert_ne!(
        hash_identity(&vec![1u8, 2, 3]).unwrap(),
        hash_identity(&vec![3u8, 2, 1]).unwrap()
    );
    assert_eq!(canonical_bytes(&[1u8, 2, 3]).unwrap(), canonical_bytes(&vec![1u8, 2, 3]).unwrap());
}

// ─────────────────────────────────────────────────────────────────────────────
// Absent References
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_absent_primitive_hashes_as_zero() {
    let absent = Counter { count: None };
    let zero = Counter { count: Some(0) };

    assert_eq!(canonical_bytes(&absent).unwrap(), vec![0, 0, 0, 0]);
    assert_eq!(hash_identity(&absent).unwrap(), hash_identity(&zero).unwrap());
    assert_ne!(
        hash_identity(&absent).unwrap(),
        hash_identity(&Counter { count: Some(1) }).unwrap()
    );
}

#[test]
fn test_absent_struct_hashes_as_zero_struct() {
    let absent = Contact { address: None };
    let zero = Contact {
        address: Some(Address {
            street: String::new(),
            zip: 0,
        }),
    };

    assert_eq!(hash_identity(&absent).unwrap(), hash_identity(&zero).unwrap());
}

#[test]
fn test_recursive_type_with_absent_tail() {
    let tail = Link {
        label: "a".to_string(),
        next: None,
    };
    assert_eq!(canonical_bytes(&tail).unwrap(), b"a".to_vec());

    let list = Link {
        label: "a".to_string(),
        next: Some(Rc::new(RefCell::new(Link {
            label: "b".to_string(),
            next: None,
        }))),
    };
    assert_eq!(canonical_bytes(&list).unwrap(), b"ab".to_vec());
}

#[test]
fn test_absent_borrowed_str_hashes_as_empty() {
    #[derive(Identity)]
    struct Labelled<'a> {
        name: &'a str,
        alias: Option<&'a str>,
    }

    let absent = Labelled {
        name: "x",
        alias: None,
    };
    let empty = Labelled {
        name: "x",
        alias: Some(""),
    };

    assert_eq!(canonical_bytes(&absent).unwrap(), b"x".to_vec());
    assert_eq!(hash_identity(&absent).unwrap(), hash_identity(&empty).unwrap());
}

#[test]
fn test_absent_borrowed_slice_hashes_as_empty() {
    #[derive(Identity)]
    struct Batch<'a> {
        items: Option<&'a [u16]>,
    }

    let absent = Batch { items: None };
    let empty = Batch { items: Some(&[]) };
    assert!(canonical_bytes(&absent).unwrap().is_empty());
    assert_eq!(hash_identity(&absent).unwrap(), hash_identity(&empty).unwrap());
}

#[test]
fn test_absent_root_is_nil_input() {
    let absent: Option<Person> = None;
    let err = hash_identity(&absent).unwrap_err();
    assert!(matches!(err, IdentityError::NilInput));
    assert_eq!(err.kind().as_str(), "destruct.nil_input");

    let weak = Rc::downgrade(&Rc::new(5u8));
    assert_eq!(hash_identity(&weak).unwrap_err().kind(), ErrorKind::NilInput);
}

#[test]
#[should_panic(expected = "identity hash failed")]
fn test_must_hash_panics_on_absent_root() {
    let absent: Option<Person> = None;
    must_hash_identity(&absent);
}

// ─────────────────────────────────────────────────────────────────────────────
// Unmatched Values
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_channel_field_is_unmatched() {
    init_tracing();

    #[derive(Identity)]
    struct Worker {
        name: String,
        notify: mpsc::Sender<u8>,
    }

    let (notify, _receiver) = mpsc::channel();
    let worker = Worker {
        name: "w1".to_string(),
        notify,
    };

    match hash_identity(&worker).unwrap_err() {
        IdentityError::UnmatchedStrategy { kind, detail } => {
            assert_eq!(kind.as_str(), "opaque");
            assert!(detail.contains("Sender"), "detail was {detail}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_function_field_is_unmatched() {
    #[derive(Identity)]
    struct Callback {
        handler: fn() -> u8,
    }

    fn answer() -> u8 {
        42
    }

    let err = hash_identity(&Callback { handler: answer }).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnmatchedStrategy);
}

#[test]
fn test_excluded_unhashable_field_is_skipped() {
    #[derive(Identity)]
    struct Worker {
        name: String,
        #[identity = "-"]
        notify: mpsc::Sender<u8>,
    }

    let (notify, _receiver) = mpsc::channel();
    let worker = Worker {
        name: "w1".to_string(),
        notify,
    };
    assert_eq!(canonical_bytes(&worker).unwrap(), b"w1".to_vec());
}

#[test]
fn test_excluded_field_needs_no_identity_impl() {
    struct Handle;

    #[derive(Identity)]
    struct Job {
        name: String,
        #[identity = "-"]
        handle: Handle,
    }

    #[derive(Identity)]
    struct Slot {
        job: Option<Job>,
    }

    let job = Job {
        name: "build".to_string(),
        handle: Handle,
    };
    assert_eq!(canonical_bytes(&job).unwrap(), b"build".to_vec());

    // Zero value of Job skips the excluded field as well
    let empty = Slot { job: None };
    assert!(canonical_bytes(&empty).unwrap().is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Traversal Guards
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_cycle_is_detected() {
    init_tracing();

    let first = Rc::new(RefCell::new(Link {
        label: "a".to_string(),
        next: None,
    }));
    let second = Rc::new(RefCell::new(Link {
        label: "b".to_string(),
        next: Some(Rc::clone(&first)),
    }));
    first.borrow_mut().next = Some(Rc::clone(&second));

    let err = hash_identity(&first).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cyclic);

    // Break the cycle so both nodes are freed
    first.borrow_mut().next = None;
}

#[test]
fn test_shared_without_cycle_is_allowed() {
    #[derive(Identity)]
    struct Pair {
        left: Rc<String>,
        right: Rc<String>,
    }

    let shared = Rc::new("same".to_string());
    let aliased = Pair {
        left: Rc::clone(&shared),
        right: Rc::clone(&shared),
    };
    let distinct = Pair {
        left: Rc::new("same".to_string()),
        right: Rc::new("same".to_string()),
    };

    assert_eq!(hash_identity(&aliased).unwrap(), hash_identity(&distinct).unwrap());
}

#[test]
fn test_depth_limit() {
    let nested = vec![vec![vec![1u8]]];

    // Three sequences and one integer
    let shallow = IdentityHasher::new(IdentityConfig::new().with_max_depth(3));
    let err = shallow.hash(&nested).unwrap_err();
    assert!(matches!(err, IdentityError::TooDeep { max_depth: 3 }));

    let deep = IdentityHasher::new(IdentityConfig::new().with_max_depth(4));
    assert_eq!(deep.canonical_bytes(&nested).unwrap(), vec![1]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Dynamic Values
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_json_key_order_ignored() {
    let literal = json!({ "name": "kernel", "tags": ["a", "b"], "size": 3 });
    let parsed: serde_json::Value =
        serde_json::from_str(r#"{"size":3,"tags":["a","b"],"name":"kernel"}"#).unwrap();

    assert_eq!(hash_identity(&literal).unwrap(), hash_identity(&parsed).unwrap());
}

#[test]
fn test_json_scalars_match_native() {
    assert_eq!(canonical_bytes(&json!(7)).unwrap(), canonical_bytes(&7u64).unwrap());
    assert_eq!(canonical_bytes(&json!(-7)).unwrap(), canonical_bytes(&-7i64).unwrap());
    assert_eq!(canonical_bytes(&json!("x")).unwrap(), b"x".to_vec());
    assert!(canonical_bytes(&json!(null)).unwrap().is_empty());
}

#[test]
fn test_boxed_trait_object_unwraps() {
    let boxed: Box<dyn Identity> = Box::new(Address {
        street: "Main".to_string(),
        zip: 1,
    });
    let plain = Address {
        street: "Main".to_string(),
        zip: 1,
    };

    assert_eq!(hash_identity(&boxed).unwrap(), hash_identity(&plain).unwrap());
}

#[test]
fn test_locks_hash_their_contents() {
    let guarded = Arc::new(Mutex::new(vec![1u8, 2]));
    assert_eq!(canonical_bytes(&guarded).unwrap(), vec![1, 2]);

    let cell = RefCell::new(9u8);
    assert_eq!(canonical_bytes(&cell).unwrap(), vec![9]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Derive Shapes
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_tuple_struct_fields() {
    #[derive(Identity)]
    struct Meters(u32, #[identity = "-"] String);

    let a = Meters(5, "first".to_string());
    let b = Meters(5, "second".to_string());
    assert_eq!(canonical_bytes(&a).unwrap(), vec![0, 0, 0, 5]);
    assert_eq!(hash_identity(&a).unwrap(), hash_identity(&b).unwrap());
}

#[test]
fn test_unit_struct_is_empty() {
    #[derive(Identity)]
    struct Marker;

    assert_eq!(hash_identity(&Marker).unwrap(), EMPTY_SHA512);
}

#[test]
fn test_generic_struct() {
    #[derive(Identity)]
    struct Tagged<T> {
        tag: String,
        value: T,
    }

    let numeric = Tagged {
        tag: "n".to_string(),
        value: 1u8,
    };
    let text = Tagged {
        tag: "n".to_string(),
        value: "1".to_string(),
    };

    assert_eq!(canonical_bytes(&numeric).unwrap(), vec![b'n', 1]);
    assert_ne!(hash_identity(&numeric).unwrap(), hash_identity(&text).unwrap());
}

#[test]
fn test_raw_identifier_field_name() {
    #[derive(Identity)]
    struct Keyword {
        r#type: String,
        name: String,
    }

    let keyword = Keyword {
        r#type: "t".to_string(),
        name: "n".to_string(),
    };
    // "name" < "type"
    assert_eq!(canonical_bytes(&keyword).unwrap(), b"nt".to_vec());
}

#[test]
fn test_non_exclusion_marker_keeps_field() {
    #[derive(Identity)]
    struct Tagged {
        #[identity = "keep"]
        id: u8,
    }

    assert_eq!(canonical_bytes(&Tagged { id: 3 }).unwrap(), vec![3]);
}
