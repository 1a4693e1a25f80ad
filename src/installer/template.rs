//! NSIS installer script template.

/// Installer script rendered per product.
///
/// Paths and names arrive pre-escaped for NSIS string literals.
pub const NSI_TEMPLATE: &str = r#"; Generated by hankstore_bundler for {{product_name}} {{version}}
Unicode true

!include "MUI2.nsh"
!include "LogicLib.nsh"

!define PRODUCT_NAME "{{product_name}}"
!define PRODUCT_VERSION "{{version}}"
!define PUBLISHER "{{publisher}}"
!define APP_EXE "{{app_exe}}"
!define HELPER_EXE "{{helper_exe}}"
!define VALUES_NAME "{{values_name}}"

; Refuse to build an installer around missing bundle outputs.
!if /FileExists "{{app_check}}"
!else
  !error "Required build artifact missing: {{app_check}}"
!endif
!if /FileExists "{{helper_source}}"
!else
  !error "Required build artifact missing: {{helper_source}}"
!endif

Name "${PRODUCT_NAME}"
!ifdef OUTPUT_FILE
  OutFile "${OUTPUT_FILE}"
!else
  OutFile "{{output_file}}"
!endif
InstallDir "$LOCALAPPDATA\Programs\${PRODUCT_NAME}"
RequestExecutionLevel user
SetCompressor /SOLID lzma

VIProductVersion "{{version_nsis}}"
VIAddVersionKey "ProductName" "${PRODUCT_NAME}"
VIAddVersionKey "CompanyName" "${PUBLISHER}"
VIAddVersionKey "FileDescription" "{{description}}"
VIAddVersionKey "FileVersion" "${PRODUCT_VERSION}"
VIAddVersionKey "ProductVersion" "${PRODUCT_VERSION}"

!insertmacro MUI_PAGE_WELCOME
!insertmacro MUI_PAGE_DIRECTORY
!insertmacro MUI_PAGE_INSTFILES
!insertmacro MUI_PAGE_FINISH
!insertmacro MUI_UNPAGE_CONFIRM
!insertmacro MUI_UNPAGE_INSTFILES
!insertmacro MUI_LANGUAGE "English"

Section "Install"
  SetOutPath "$INSTDIR"
{{#if app_is_dir}}
  File /r "{{app_source}}\*"
{{else}}
  File "{{app_source}}"
{{/if}}
  File "{{helper_source}}"
{{#if values_source}}

  SetOutPath "$TEMP"
  File "/oname=${VALUES_NAME}" "{{values_source}}"
  SetOutPath "$INSTDIR"
{{/if}}

  System::Call 'Kernel32::SetEnvironmentVariable(t "{{values_env}}", t "$TEMP\${VALUES_NAME}")i'
  ClearErrors
  ExecWait '"$INSTDIR\${HELPER_EXE}" --write-env' $0
  ${If} ${Errors}
    MessageBox MB_ICONSTOP|MB_OK "Could not start the configuration helper. The application files were installed. Run $\"$INSTDIR\${HELPER_EXE}$\" --write-env to finish the configuration."
  ${ElseIf} $0 != 0
    MessageBox MB_ICONEXCLAMATION|MB_OK "The configuration helper exited with code $0. Configuration may be incomplete; the application files were kept."
  ${EndIf}
  Delete "$TEMP\${VALUES_NAME}"

  CreateDirectory "$SMPROGRAMS\${PRODUCT_NAME}"
  CreateShortcut "$SMPROGRAMS\${PRODUCT_NAME}\${PRODUCT_NAME}.lnk" "$INSTDIR\${APP_EXE}"
  CreateShortcut "$DESKTOP\${PRODUCT_NAME}.lnk" "$INSTDIR\${APP_EXE}"
  WriteUninstaller "$INSTDIR\uninstall.exe"
SectionEnd

Section "Uninstall"
  Delete "$DESKTOP\${PRODUCT_NAME}.lnk"
  Delete "$SMPROGRAMS\${PRODUCT_NAME}\${PRODUCT_NAME}.lnk"
  RMDir "$SMPROGRAMS\${PRODUCT_NAME}"
{{#each installed_files}}
  Delete "{{this}}"
{{/each}}
  Delete "$INSTDIR\${HELPER_EXE}"
  Delete "$INSTDIR\uninstall.exe"
{{#each installed_dirs}}
  RMDir "{{this}}"
{{/each}}
  ; Non-recursive: content the installer did not place keeps the directory.
  RMDir "$INSTDIR"
SectionEnd
"#;
