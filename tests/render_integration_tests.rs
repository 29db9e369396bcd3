mod utils;

use std::fs;
use test_log::test;
use tome::cli::run;
use tome::constants::MANIFEST_FILE;
use tome::error::Error;
use utils::{args, run_and_assert, write_tree};

#[test]
fn renders_a_tree_with_values_overrides_and_strip() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_tree(
        src.path(),
        &[
            ("greeting.txt.tmpl", "Hello, {{ Name }}!\n"),
            ("{{ app.name }}/config.yaml.tmpl", "port: {{ app.port }}\ndebug: {{ debug }}\n"),
            ("README.md", "# {{ Name }}\n"),
        ],
    );
    let values_dir = tempfile::tempdir().unwrap();
    let values = values_dir.path().join("values.yaml");
    fs::write(&values, "Name: World\napp:\n  name: web\n  port: 80\n").unwrap();

    let mut run_args = args(src.path(), Some(out.path()));
    run_args.values = vec![values];
    run_args.set = vec!["app.port=8080".into(), "debug=true".into()];
    run_args.strip = vec![".tmpl".into()];

    run_and_assert(
        run_args,
        &[
            ("greeting.txt", "Hello, World!\n"),
            ("web/config.yaml", "port: 8080\ndebug: true\n"),
            ("README.md", "# World\n"),
        ],
    );
}

#[test]
fn value_files_see_environment_variables() {
    std::env::set_var("TOME_IT_REGION", "eu-west-1");
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let values_dir = tempfile::tempdir().unwrap();
    write_tree(src.path(), &[("region.txt", "{{ region }} {{ literal }}")]);
    let values = values_dir.path().join("values.yaml");
    fs::write(&values, "region: ${TOME_IT_REGION}\nliteral: ${{HOME}}\n").unwrap();

    let mut run_args = args(src.path(), Some(out.path()));
    run_args.values = vec![values];

    run_and_assert(run_args, &[("region.txt", "eu-west-1 ${HOME}")]);
}

#[test]
fn copy_patterns_keep_bytes_identical() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let blob = [0u8, 0xff, b'{', b'{', b' ', b'x', b' ', b'}', b'}', 0x80];
    fs::create_dir_all(src.path().join("assets")).unwrap();
    fs::write(src.path().join("assets/logo.bin"), blob).unwrap();
    write_tree(src.path(), &[("assets/raw.txt", "{{ not_rendered }}")]);

    let mut run_args = args(src.path(), Some(out.path()));
    run_args.copy = vec!["**/*.bin".into(), "assets/raw.txt".into()];
    run(run_args).unwrap();

    assert_eq!(fs::read(out.path().join("assets/logo.bin")).unwrap(), blob);
    assert_eq!(
        fs::read_to_string(out.path().join("assets/raw.txt")).unwrap(),
        "{{ not_rendered }}"
    );
}

#[test]
fn temp_patterns_render_only_what_they_name() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_tree(src.path(), &[("a.j2", "{{ v }}"), ("b.txt", "{{ v }}")]);

    let mut run_args = args(src.path(), Some(out.path()));
    run_args.temp = vec!["*.j2".into()];
    run_args.strip = vec![".j2".into()];
    run_args.set = vec!["v=1".into()];

    run_and_assert(run_args, &[("a", "1"), ("b.txt", "{{ v }}")]);
}

#[test]
fn include_lists_must_name_directories() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_tree(
        src.path(),
        &[("conf/app.yaml", "a"), ("conf/notes.md", "n"), ("other/app.yaml", "o")],
    );

    let mut run_args = args(src.path(), Some(out.path()));
    run_args.include = vec!["conf".into(), "conf/*.yaml".into()];

    run_and_assert(run_args, &[("conf/app.yaml", "a")]);
}

#[test]
fn strict_mode_reports_missing_values() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_tree(src.path(), &[("person.txt", "{{ Name }} {{ Age }}")]);

    let mut run_args = args(src.path(), Some(out.path()));
    run_args.set = vec!["Name=A".into()];
    run_args.strict = true;

    match run(run_args) {
        Err(Error::MissingValueError { keys, .. }) => assert_eq!(keys, vec!["Age"]),
        other => panic!("Expected MissingValueError, got {other:?}"),
    }
    assert!(!out.path().join("person.txt").exists());
}

#[test]
fn lenient_mode_renders_missing_values_empty() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_tree(src.path(), &[("person.txt", "{{ Name }} {{ Age }}")]);

    let mut run_args = args(src.path(), Some(out.path()));
    run_args.set = vec!["Name=A".into()];

    run_and_assert(run_args, &[("person.txt", "A ")]);
}

#[test]
fn manifests_fan_out_into_variants() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let elsewhere = tempfile::tempdir().unwrap();
    write_tree(
        src.path(),
        &[
            (
                "services/.tome.yaml",
                "{% for name in names %}\n- target: {{ name }}\n  values:\n    service: {{ name }}\n{% endfor %}\n\
                 - target: {{ elsewhere }}\n  values:\n    service: external\n",
            ),
            ("services/{{ service }}.conf", "service={{ service }} team={{ team }}\n"),
        ],
    );

    let mut run_args = args(src.path(), Some(out.path()));
    run_args.set = vec![
        "names={api, worker}".into(),
        "team=core".into(),
        format!("elsewhere={}", elsewhere.path().display()),
    ];
    run(run_args).unwrap();

    assert_eq!(
        fs::read_to_string(out.path().join("api/api.conf")).unwrap(),
        "service=api team=core\n"
    );
    assert_eq!(
        fs::read_to_string(out.path().join("worker/worker.conf")).unwrap(),
        "service=worker team=core\n"
    );
    assert_eq!(
        fs::read_to_string(elsewhere.path().join("external.conf")).unwrap(),
        "service=external team=core\n"
    );
    assert!(!out.path().join("api").join(MANIFEST_FILE).exists());
}

#[test]
fn nested_manifests_inherit_from_their_parent_variant() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_tree(
        src.path(),
        &[
            (".tome.yaml", "strip: .tmpl\nvalues:\n  level: root\n  keep: yes-kept\n"),
            ("child/.tome.yaml", "- {}\n- target: renamed\n  values:\n    level: child\n"),
            ("child/file.txt.tmpl", "{{ level }} {{ keep }}"),
        ],
    );

    run(args(src.path(), Some(out.path()))).unwrap();

    assert_eq!(fs::read_to_string(out.path().join("child/file.txt")).unwrap(), "root yes-kept");
    assert_eq!(
        fs::read_to_string(out.path().join("renamed/file.txt")).unwrap(),
        "child yes-kept"
    );
}

#[test]
fn segments_that_render_empty_collapse() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_tree(src.path(), &[("{% if flag %}opt{% endif %}/file.txt", "x")]);

    run_and_assert(args(src.path(), Some(out.path())), &[("file.txt", "x")]);
}

#[test]
fn dry_run_writes_nothing() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_tree(src.path(), &[("dir/file.txt", "x")]);

    let mut run_args = args(src.path(), Some(out.path()));
    run_args.dry_run = true;
    run(run_args).unwrap();

    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn directories_require_an_output() {
    let src = tempfile::tempdir().unwrap();
    assert!(matches!(run(args(src.path(), None)), Err(Error::ConfigError(_))));
}

#[test]
fn single_files_render_to_the_given_output() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_tree(src.path(), &[("{{ ignored }}.txt", "Hello, {{ Name }}!\n")]);
    let target = out.path().join("nested/hello.txt");

    let mut run_args = args(&src.path().join("{{ ignored }}.txt"), Some(&target));
    run_args.set = vec!["Name=World".into()];
    run(run_args).unwrap();

    assert_eq!(fs::read_to_string(target).unwrap(), "Hello, World!\n");
}

#[test]
fn invalid_manifests_are_configuration_errors() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_tree(src.path(), &[("a/.tome.yaml", "include: [x]\nexclude: [y]\n"), ("a/f", "")]);

    assert!(matches!(run(args(src.path(), Some(out.path()))), Err(Error::ConfigError(_))));
}

#[cfg(unix)]
#[test]
fn manifest_modes_may_be_unquoted_numbers() {
    use std::os::unix::fs::PermissionsExt;

    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_tree(src.path(), &[("svc/.tome.yaml", "mode: 600\n"), ("svc/secret.txt", "s")]);

    run(args(src.path(), Some(out.path()))).unwrap();

    let secret = out.path().join("svc/secret.txt");
    assert_eq!(fs::metadata(secret).unwrap().permissions().mode() & 0o777, 0o600);
}

#[cfg(unix)]
#[test]
fn symlinks_and_modes_are_recreated() {
    use std::os::unix::fs::PermissionsExt;

    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_tree(src.path(), &[("bin/run.sh", "#!/bin/sh\necho {{ msg }}\n")]);
    std::os::unix::fs::symlink("bin/run.sh", src.path().join("run")).unwrap();

    let mut run_args = args(src.path(), Some(out.path()));
    run_args.set = vec!["msg=hi".into()];
    run_args.mode = Some("rwxr-x---".into());
    run(run_args).unwrap();

    let script = out.path().join("bin/run.sh");
    assert_eq!(fs::read_to_string(&script).unwrap(), "#!/bin/sh\necho hi\n");
    assert_eq!(fs::metadata(&script).unwrap().permissions().mode() & 0o777, 0o750);
    assert_eq!(
        fs::read_link(out.path().join("run")).unwrap(),
        std::path::PathBuf::from("bin/run.sh")
    );
}
