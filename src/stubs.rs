//! Built-in templates for generated modules and themes.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ExtError;

/// Files generated for a new module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubKind {
    WebRoutes,
    ApiRoutes,
    Provider,
    Controller,
    Manifest,
    Hooks,
    View,
}

impl StubKind {
    /// Override file name under the stubs directory
    pub fn file_name(self) -> &'static str {
        match self {
            StubKind::WebRoutes => "routes/web.stub",
            StubKind::ApiRoutes => "routes/api.stub",
            StubKind::Provider => "provider.stub",
            StubKind::Controller => "controller.stub",
            StubKind::Manifest => "module.stub",
            StubKind::Hooks => "hooks.stub",
            StubKind::View => "view.stub",
        }
    }

    pub fn builtin(self) -> &'static str {
        match self {
            StubKind::WebRoutes => WEB_ROUTES,
            StubKind::ApiRoutes => API_ROUTES,
            StubKind::Provider => PROVIDER,
            StubKind::Controller => CONTROLLER,
            StubKind::Manifest => MODULE_MANIFEST,
            StubKind::Hooks => HOOKS,
            StubKind::View => MODULE_VIEW,
        }
    }
}

/// Template source plus placeholder values
#[derive(Debug, Clone)]
pub struct Stubs {
    overrides: Option<PathBuf>,
    replacements: Vec<(&'static str, String)>,
}

impl Stubs {
    pub fn new(overrides: Option<&Path>) -> Self {
        Self {
            overrides: overrides.map(Path::to_path_buf),
            replacements: Vec::new(),
        }
    }

    pub fn with(mut self, placeholder: &'static str, value: impl Into<String>) -> Self {
        self.replacements.push((placeholder, value.into()));
        self
    }

    /// Render `kind`, preferring an override file when one exists
    pub fn render(&self, kind: StubKind) -> Result<String, ExtError> {
        let custom = self
            .overrides
            .as_ref()
            .map(|dir| dir.join(kind.file_name()))
            .filter(|path| path.is_file());

        let template = match custom {
            Some(path) => fs::read_to_string(path)?,
            None => kind.builtin().to_string(),
        };
        Ok(self.fill(&template))
    }

    /// Replace every known placeholder in `template`
    pub fn fill(&self, template: &str) -> String {
        self.replacements
            .iter()
            .fold(template.to_string(), |text, (placeholder, value)| {
                text.replace(placeholder, value)
            })
    }
}

const WEB_ROUTES: &str = r#"<?php

use Illuminate\Support\Facades\Route;
use {{ControllersNamespace}}\{{ModuleName}}Controller;

Route::prefix('{{module_route}}')->group(function () {
    Route::get('/', [{{ModuleName}}Controller::class, 'index']);
});
"#;

const API_ROUTES: &str = r#"<?php

use Illuminate\Support\Facades\Route;

Route::prefix('api/{{module_route}}')->group(function () {
    //
});
"#;

const PROVIDER: &str = r#"<?php

namespace {{ProvidersNamespace}};

use Illuminate\Support\ServiceProvider;

class {{ModuleName}}ServiceProvider extends ServiceProvider
{
    public function boot()
    {
        $root = {{ModuleRoot}};

        $this->loadRoutesFrom($root . '/{{RoutesDir}}/web.php');
        $this->loadViewsFrom($root . '/{{ViewsDir}}', '{{module_name}}');
        $this->loadMigrationsFrom($root . '/{{MigrationsDir}}');
    }

    public function register()
    {
        //
    }
}
"#;

const CONTROLLER: &str = r#"<?php

namespace {{ControllersNamespace}};

use App\Http\Controllers\Controller;

class {{ModuleName}}Controller extends Controller
{
    public function index()
    {
        return view('{{module_name}}::index');
    }
}
"#;

const MODULE_MANIFEST: &str = r#"{
    "name": "{{ModuleName}}",
    "description": "{{ModuleName}} module",
    "enabled": true,
    "version": "1.0.0",
    "dependencies": []
}
"#;

const HOOKS: &str = r#"<?php

/**
 * {{ModuleName}} module hooks
 *
 * Hook::listen('post.content', function ($content) {
 *     return $content;
 * });
 */

use Fastcmf\Modules\Facades\Hook;

Hook::listen('module.boot.after', function ($module) {
    if ($module->getName() === '{{ModuleName}}') {
        //
    }
    return $module;
});
"#;

const MODULE_VIEW: &str = r#"<div>
    <h1>{{ModuleName}} module</h1>
    <p>This is the {{ModuleName}} module home page.</p>
</div>
"#;

pub const THEME_JSON: &str = r#"{
    "name": "{{ThemeName}}",
    "description": "{{ThemeTitle}} Theme",
    "version": "1.0.0",
    "author": "Your Name",
    "email": "your.email@example.com"
}
"#;

pub const THEME_STYLE: &str = r#"body {
    font-family: Arial, sans-serif;
    line-height: 1.6;
    color: #333;
    background-color: #f5f5f5;
    margin: 0;
    padding: 0;
}

.container {
    max-width: 1200px;
    margin: 0 auto;
    padding: 0 15px;
}

.header {
    background-color: #fff;
    box-shadow: 0 2px 4px rgba(0, 0, 0, 0.1);
    padding: 15px 0;
    margin-bottom: 20px;
}

.footer {
    background-color: #333;
    color: #fff;
    padding: 20px 0;
    margin-top: 30px;
    text-align: center;
}

.card {
    background-color: #fff;
    border-radius: 4px;
    box-shadow: 0 2px 4px rgba(0, 0, 0, 0.1);
    margin-bottom: 20px;
    padding: 20px;
}
"#;

pub const THEME_SCRIPT: &str = r#"document.addEventListener('DOMContentLoaded', function () {
    console.log('Theme {{ThemeName}} loaded');
});
"#;

pub const THEME_LAYOUT: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>@yield('title', config('app.name'))</title>
    <link rel="stylesheet" href="{{ theme()->asset('css/style.css') }}">
    @yield('styles')
</head>
<body>
    <header class="header">
        <div class="container">
            <h1>{{ config('app.name', 'Laravel') }}</h1>
        </div>
    </header>

    <main class="container">
        @yield('content')
    </main>

    <footer class="footer">
        <div class="container">
            <p>&copy; {{ date('Y') }} {{ config('app.name', 'Laravel') }}</p>
        </div>
    </footer>

    <script src="{{ theme()->asset('js/app.js') }}"></script>
    @yield('scripts')
</body>
</html>
"#;

pub const THEME_INDEX: &str = r#"@extends('theme::layouts.default')

@section('title', 'Home')

@section('content')
    <div class="card">
        <h2>Welcome</h2>
        <p>This page belongs to the {{ThemeName}} theme.</p>
    </div>
@endsection
"#;

pub const ADMIN_INDEX: &str = r#"@extends('theme::layouts.admin')

@section('title', 'Dashboard')

@section('content')
    <div class="card">
        <h2>Dashboard</h2>
        <p>This page belongs to the {{ThemeName}} admin theme.</p>
    </div>
@endsection
"#;

pub const ADMIN_FORM: &str = r#"@extends('theme::layouts.admin')

@section('title', 'Form')

@section('content')
    <div class="card">
        <form action="/admin/form" method="POST">
            @csrf
            <div class="form-group">
                <label for="name">Name</label>
                <input type="text" id="name" name="name" class="form-control" required>
            </div>
            <div class="form-group">
                <label for="email">Email</label>
                <input type="email" id="email" name="email" class="form-control" required>
            </div>
            <button type="submit" class="btn btn-primary">Submit</button>
        </form>
    </div>
@endsection
"#;
