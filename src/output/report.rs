use super::InsightsRecord;

fn json_for_script_tag(value: &str) -> String {
    value.replace("</", "<\\/")
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

pub fn render_html(record: &InsightsRecord<'_>) -> Vec<u8> {
    let json = serde_json::to_string(record).unwrap_or_else(|_| "{}".to_string());
    let json = json_for_script_tag(&json);
    let title = escape_html(&record.title);

    let html = format!(
        r####"<!DOCTYPE html>
<html lang="pt-BR">
<head>
  <meta charset="utf-8"/>
  <meta content="width=device-width, initial-scale=1.0" name="viewport"/>
  <title>{title}</title>
  <script src="https://cdn.tailwindcss.com?plugins=forms"></script>
  <link href="https://fonts.googleapis.com/css2?family=Montserrat:wght@700;800&amp;family=Inter:wght@400;500;600;700&amp;display=swap" rel="stylesheet"/>
  <style type="text/tailwindcss">
    body {{
      font-family: 'Inter', sans-serif;
    }}
    h1, h2, h3 {{
      font-family: 'Montserrat', sans-serif;
      font-weight: 800;
      letter-spacing: -0.025em;
    }}
  </style>
</head>
<body class="bg-slate-50 text-slate-900 min-h-screen">
  <script type="application/json" id="insights-data">{json}</script>
  <header class="border-b border-slate-200 bg-white px-8 py-4 sticky top-0 z-50">
    <h2 id="page-title" class="text-xl uppercase tracking-tight">{title}</h2>
  </header>

  <main class="max-w-[1440px] mx-auto w-full px-8 py-10">
    <div class="bg-white rounded-2xl border border-slate-200 p-5 mb-8 shadow-sm flex flex-wrap gap-4 items-center">
      <select id="page-filter" class="rounded-xl border-slate-200 text-sm"></select>
      <input id="text-filter" class="rounded-xl border-slate-200 text-sm flex-1 min-w-[240px]" placeholder="Filtrar por texto" type="text"/>
      <select id="person-filter" class="rounded-xl border-slate-200 text-sm"></select>
      <input id="person-search" list="authors" class="rounded-xl border-slate-200 text-sm" placeholder="Criado por" type="text"/>
      <datalist id="authors"></datalist>
    </div>

    <noscript>
      <div class="bg-amber-50 border border-amber-200 rounded-2xl p-5 mb-8 font-bold text-amber-800">This report requires JavaScript to render results.</div>
    </noscript>

    <p id="comment-count" class="text-sm font-bold text-slate-500 mb-3"></p>
    <div class="mb-10">
      <button class="copy-button mb-2 rounded-lg bg-slate-900 text-white text-xs font-bold px-4 py-2" data-table="comments-table" type="button">Copiar Dados</button>
      <div class="bg-white border border-slate-200 rounded-2xl overflow-x-auto shadow-sm">
        <table id="comments-table" class="w-full text-left text-sm">
          <thead class="bg-slate-50 border-b border-slate-200"></thead>
          <tbody class="divide-y divide-slate-100"></tbody>
        </table>
      </div>
    </div>

    <div id="keyword-tables-container" class="grid grid-cols-1 md:grid-cols-2 xl:grid-cols-4 gap-6"></div>
  </main>

  <script>
    (function() {{
      const data = JSON.parse(document.getElementById('insights-data').textContent || '{{}}');
      const comments = data.comments || [];
      const headers = ['Comentário', 'Página', 'Autor', 'Criado em', 'Status', 'Resolvido em'];

      function escapeHtml(value) {{
        return String(value)
          .replaceAll('&', '&amp;')
          .replaceAll('<', '&lt;')
          .replaceAll('>', '&gt;')
          .replaceAll('"', '&quot;')
          .replaceAll("'", '&#39;');
      }}

      function fillSelect(el, allLabel, items) {{
        el.innerHTML = '';
        const any = document.createElement('option');
        any.value = '';
        any.textContent = allLabel;
        el.appendChild(any);
        for (const item of items) {{
          const opt = document.createElement('option');
          opt.value = item.value;
          opt.textContent = item.label;
          el.appendChild(opt);
        }}
      }}

      const pageFilter = document.getElementById('page-filter');
      const textFilter = document.getElementById('text-filter');
      const personFilter = document.getElementById('person-filter');
      const personSearch = document.getElementById('person-search');
      const countEl = document.getElementById('comment-count');
      const table = document.getElementById('comments-table');

      fillSelect(pageFilter, 'Todas as Páginas', (data.page_options || []).map(p => ({{ value: p.id, label: p.name }})));
      fillSelect(personFilter, 'Todos os mencionados', (data.mentions || []).map(m => ({{ value: m, label: m }})));
      const authors = document.getElementById('authors');
      for (const a of (data.authors || [])) {{
        const opt = document.createElement('option');
        opt.value = a;
        authors.appendChild(opt);
      }}

      const filters = data.filters || {{}};
      pageFilter.value = filters.page_id || '';
      textFilter.value = filters.free_text || '';
      personFilter.value = filters.mentioned_person || '';
      personSearch.value = filters.author_substring || '';

      table.querySelector('thead').innerHTML =
        '<tr>' + headers.map(h => `<th class="px-4 py-3 text-[11px] uppercase tracking-widest">${{escapeHtml(h)}}</th>`).join('') + '</tr>';

      const body = table.querySelector('tbody');
      body.innerHTML = comments.map(c => {{
        const cells = [c.message, c.page, c.author, c.created_at, c.status, c.resolved_at];
        return `<tr data-page-id="${{escapeHtml(c.page_id || '')}}" data-comment-text="${{escapeHtml(c.lowercase_message)}}" data-user-handle="${{escapeHtml(c.lowercase_author)}}">` +
          cells.map(v => `<td class="px-4 py-3">${{escapeHtml(v)}}</td>`).join('') + '</tr>';
      }}).join('');

      function filterComments() {{
        const pageValue = pageFilter.value;
        const textValue = textFilter.value.toLowerCase();
        const mentionValue = personFilter.value.toLowerCase();
        const authorValue = personSearch.value.toLowerCase();
        let visible = 0;
        for (const row of body.querySelectorAll('tr')) {{
          const ok = (pageValue === '' || row.dataset.pageId === pageValue)
            && (textValue === '' || row.dataset.commentText.includes(textValue))
            && (mentionValue === '' || row.dataset.commentText.includes(mentionValue))
            && (authorValue === '' || row.dataset.userHandle.includes(authorValue));
          row.style.display = ok ? '' : 'none';
          if (ok) visible++;
        }}
        countEl.textContent = `Total de Comentários: ${{visible}}`;
      }}

      function countsTable(title, counters) {{
        const rows = counters.map(c => `<tr><td class="px-4 py-2">${{escapeHtml(c.tag)}}</td><td class="px-4 py-2">${{c.count}}</td></tr>`).join('');
        return `<thead class="bg-slate-50"><tr><th colspan="2" class="px-4 py-3">${{escapeHtml(title)}}</th></tr>` +
          '<tr><th class="px-4 py-2">Palavra-chave</th><th class="px-4 py-2">Ocorrências</th></tr></thead>' +
          `<tbody class="divide-y divide-slate-100">${{rows}}</tbody>`;
      }}

      const container = document.getElementById('keyword-tables-container');
      const tables = (data.mention_counters || []).map(p => [`Responsável - ${{p.person}}`, p.tags]);
      tables.push(['Total de Ocorrências por Tag', data.total_tag_counters || []]);
      tables.forEach(([title, counters], idx) => {{
        const wrapper = document.createElement('div');
        wrapper.className = 'table-container bg-white border border-slate-200 rounded-2xl p-4 shadow-sm';
        const t = document.createElement('table');
        t.id = `keyword-table-${{idx}}`;
        t.className = 'w-full text-left text-sm';
        t.innerHTML = countsTable(title, counters);
        const button = document.createElement('button');
        button.type = 'button';
        button.className = 'copy-button mt-3 rounded-lg bg-slate-900 text-white text-xs font-bold px-4 py-2';
        button.dataset.table = t.id;
        button.textContent = 'Copiar Dados';
        wrapper.appendChild(t);
        wrapper.appendChild(button);
        container.appendChild(wrapper);
      }});

      function tableText(t) {{
        let text = '';
        for (const row of t.querySelectorAll('tr')) {{
          if (row.style.display === 'none') continue;
          const cells = Array.from(row.querySelectorAll('th, td')).map(cell => cell.textContent.trim());
          text += cells.join('\t') + '\n';
        }}
        return text;
      }}

      document.addEventListener('click', function(ev) {{
        const button = ev.target.closest('.copy-button');
        if (!button) return;
        const t = document.getElementById(button.dataset.table);
        navigator.clipboard.writeText(tableText(t)).then(function() {{
          const original = button.textContent;
          button.textContent = 'Copiado!';
          setTimeout(function() {{ button.textContent = original; }}, 2000);
        }});
      }});

      pageFilter.addEventListener('change', filterComments);
      personFilter.addEventListener('change', filterComments);
      textFilter.addEventListener('input', filterComments);
      personSearch.addEventListener('input', filterComments);
      filterComments();
    }})();
  </script>
</body>
</html>"####,
    );

    html.into_bytes()
}
