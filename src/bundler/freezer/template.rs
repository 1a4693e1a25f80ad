//! Freezer spec template.

/// PyInstaller spec rendered per script target.
///
/// String values are inserted pre-quoted; the template never quotes them itself.
pub const SPEC_TEMPLATE: &str = r#"# -*- mode: python ; coding: utf-8 -*-
# Generated by hankstore_bundler for {{name}} {{version}} ({{mode}})

a = Analysis(
    [{{entry}}],
    pathex=[{{pathex}}],
    binaries=[
{{#each binaries}}        ({{this.source}}, {{this.dest}}),
{{/each}}    ],
    datas=[
{{#each datas}}        ({{this.source}}, {{this.dest}}),
{{/each}}    ],
    hiddenimports=[
{{#each hidden_imports}}        {{this}},
{{/each}}    ],
    hookspath=[],
    runtime_hooks=[{{#each runtime_hooks}}{{this}}{{#unless @last}}, {{/unless}}{{/each}}],
    excludes=[],
    noarchive=False,
)
pyz = PYZ(a.pure)
{{#if onefile}}
exe = EXE(
    pyz,
    a.scripts,
    a.binaries,
    a.datas,
    [],
    name={{exe_name}},
    debug=False,
    strip=False,
    upx=False,
    console={{console}},
{{#if icon}}    icon=[{{icon}}],
{{/if}})
{{else}}
exe = EXE(
    pyz,
    a.scripts,
    [],
    exclude_binaries=True,
    name={{exe_name}},
    debug=False,
    strip=False,
    upx=False,
    console={{console}},
{{#if icon}}    icon=[{{icon}}],
{{/if}})
coll = COLLECT(
    exe,
    a.binaries,
    a.datas,
    strip=False,
    upx=False,
    name={{exe_name}},
)
{{/if}}
"#;
